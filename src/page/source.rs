//! Page source - one render target.

use std::path::{Path, PathBuf};

/// One render target: a content file rendered into one locale namespace.
///
/// ```text
/// content/en/guide/intro.md   (locales = ["en", "it"], default = "en")
///
/// PageSource {
///     source:  content/en/guide/intro.md
///     locale:  en
///     logical: guide/intro.md
///     output:  public/guide/intro.html
///     url:     /guide/intro.html
///     depth:   1
/// }
/// ```
///
/// A missing `it` translation produces a second target with the same
/// `source`, `output = public/it/guide/intro.html` and `fallback_from = en`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageSource {
    /// Absolute path of the file that is read.
    pub source: PathBuf,
    pub locale: String,
    /// Path below the content root with the locale directory stripped.
    pub logical: PathBuf,
    /// Absolute output file.
    pub output: PathBuf,
    /// Site-absolute URL, `index.html` collapsed to its directory.
    pub url: String,
    /// Directory levels of the output below the output root.
    pub depth: usize,
    /// Locale whose file backs this target when it is a synthesized fallback.
    pub fallback_from: Option<String>,
}

impl PageSource {
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.fallback_from.is_some()
    }

    /// Relative prefix from this page back to the site root (`""`, `"../"`, ...).
    pub fn root_prefix(&self) -> String {
        "../".repeat(self.depth)
    }

    /// Logical path without extension, for log lines.
    pub fn display_name(&self) -> String {
        let stem = self.logical.with_extension("");
        let name = crate::utils::path::to_slash(&stem);
        match &self.fallback_from {
            Some(from) => format!("{}:{name} (from {from})", self.locale),
            None => format!("{}:{name}", self.locale),
        }
    }

    pub fn is_source(&self, path: &Path) -> bool {
        self.source == path
    }
}
