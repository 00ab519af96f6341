//! Configuration section definitions.
//!
//! | Section        | Purpose                                           |
//! |----------------|---------------------------------------------------|
//! | `[site]`       | Site title and public URL                         |
//! | `[build]`      | Source roots, output, walk limits, sitemap        |
//! | `[i18n]`       | Available locales and the default locale          |
//! | `[watch]`      | Debounce window for `vellum watch`                |
//! | `[[plugins]]`  | External command plugins bound to hook events     |

mod build;
mod i18n;
mod plugin;
mod site;
mod watch;

pub use build::BuildSectionConfig;
pub use i18n::I18nConfig;
pub use plugin::PluginConfig;
pub use site::SiteSectionConfig;
pub use watch::WatchConfig;
