//! Configuration utility types.
//!
//! | Module   | Purpose                                        |
//! |----------|------------------------------------------------|
//! | `error`  | Configuration errors and collected diagnostics |
//! | `field`  | Field paths used in diagnostics                |
//! | `handle` | Live config with hash-gated reload             |

mod error;
mod field;
mod handle;

pub use error::{ConfigDiagnostics, ConfigError};
pub use field::FieldPath;
pub use handle::ConfigHandle;
