//! Locale detection and output namespacing.

use crate::utils::path::to_slash;
use std::path::{Component, Path, PathBuf};

/// Locale layout of the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    available: Vec<String>,
    default: String,
    prefix_default: bool,
}

impl LocaleSettings {
    pub fn new(available: Vec<String>, default: String, prefix_default: bool) -> Self {
        Self {
            available,
            default,
            prefix_default,
        }
    }

    /// Locales in configured (fallback) order.
    #[inline]
    pub fn available(&self) -> &[String] {
        &self.available
    }

    #[inline]
    pub fn default_locale(&self) -> &str {
        &self.default
    }

    /// Fewer than two locales: no locale directories are interpreted.
    #[inline]
    pub fn is_legacy(&self) -> bool {
        self.available.len() < 2
    }

    /// Split a content-relative path into `(locale, logical path)`.
    ///
    /// ```text
    /// it/guide.md  → ("it", guide.md)
    /// guide.md     → ("en", guide.md)     default locale
    /// it.md        → ("en", it.md)        a file is never a locale directory
    /// ```
    pub fn detect(&self, relative: &Path) -> (String, PathBuf) {
        if !self.is_legacy() {
            let mut components = relative.components();
            if let Some(Component::Normal(first)) = components.next() {
                let rest = components.as_path();
                if !rest.as_os_str().is_empty()
                    && let Some(locale) = self.available.iter().find(|l| first == l.as_str())
                {
                    return (locale.clone(), rest.to_path_buf());
                }
            }
        }
        (self.default.clone(), relative.to_path_buf())
    }

    /// Whether outputs of `locale` live under a `<locale>/` directory.
    #[inline]
    pub fn needs_prefix(&self, locale: &str) -> bool {
        !self.is_legacy() && (locale != self.default || self.prefix_default)
    }

    fn namespaced(&self, locale: &str, path: PathBuf) -> PathBuf {
        if self.needs_prefix(locale) {
            Path::new(locale).join(path)
        } else {
            path
        }
    }

    /// Output path of a page, relative to the output root.
    pub fn page_output(&self, locale: &str, logical: &Path) -> PathBuf {
        self.namespaced(locale, logical.with_extension("html"))
    }

    /// Output path of a non-page file found under the content root.
    pub fn asset_output(&self, relative: &Path) -> PathBuf {
        let (locale, logical) = self.detect(relative);
        self.namespaced(&locale, logical)
    }
}

/// Site-absolute URL of an output path relative to the output root.
///
/// `index.html` collapses to its directory: `it/index.html` → `/it/`.
pub fn url_for(output_relative: &Path) -> String {
    let slashed = to_slash(output_relative);
    match slashed.strip_suffix("index.html") {
        Some(dir) if dir.is_empty() || dir.ends_with('/') => format!("/{dir}"),
        _ => format!("/{slashed}"),
    }
}

/// Directory levels of an output path below the output root.
pub fn depth_of(output_relative: &Path) -> usize {
    output_relative.components().count().saturating_sub(1)
}
