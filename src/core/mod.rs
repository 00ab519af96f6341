//! Core types - pure abstractions shared across the codebase.

mod category;
mod driver;
mod state;

pub use category::{ChangeCategory, is_markdown};
pub use driver::BuildMode;
pub use state::{is_shutdown, setup_shutdown_handler};
