//! Command-line interface module.

mod args;
mod build;
mod watch;

pub use args::{Cli, Commands};
pub use build::build_site;
pub use watch::watch_site;
