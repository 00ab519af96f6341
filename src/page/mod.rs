//! Page types: render targets and rendered results.

mod rendered;
mod source;

pub use rendered::{PageStatus, RenderedPage};
pub use source::PageSource;
