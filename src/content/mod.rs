//! Content tree: scanning, locale detection and the page registry.
//!
//! ```text
//! content/
//! ├── en/guide.md   → public/guide.html          (default locale)
//! ├── it/guide.md   → public/it/guide.html
//! └── en/faq.md     → public/faq.html
//!                     public/it/faq.html          (fallback from en)
//! ```

mod locale;
mod registry;
mod scan;

pub use locale::{LocaleSettings, url_for};
pub use registry::{ContentRegistry, Translation};
pub use scan::ScanError;
