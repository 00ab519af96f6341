//! Change category definitions.

use std::path::Path;

use crate::utils::path::extension_lower;

/// Category a changed path belongs to, determines the rebuild strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeCategory {
    /// Markdown page under the content root - re-render its pages
    Content,
    /// Template or partial - re-render its dependents
    Template,
    /// Stylesheet - copy only
    Style,
    /// Client script - copy only
    Script,
    /// Any other static file - copy only
    Asset,
    /// Plugin source - full rebuild
    Plugin,
    /// Site config or data file - full rebuild
    Config,
}

impl ChangeCategory {
    pub const ALL: [Self; 7] = [
        Self::Content,
        Self::Template,
        Self::Style,
        Self::Script,
        Self::Asset,
        Self::Plugin,
        Self::Config,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Template => "template",
            Self::Style => "style",
            Self::Script => "script",
            Self::Asset => "asset",
            Self::Plugin => "plugin",
            Self::Config => "config",
        }
    }

    /// Categories whose changes only need the side-effect asset copy.
    #[inline]
    pub fn is_copy_only(self) -> bool {
        matches!(self, Self::Style | Self::Script | Self::Asset)
    }

    /// Stylesheet or script by extension, `Asset` otherwise.
    pub fn from_static_extension(path: &Path) -> Self {
        match extension_lower(path).as_str() {
            "css" | "scss" | "sass" => Self::Style,
            "js" | "mjs" | "ts" => Self::Script,
            _ => Self::Asset,
        }
    }
}

/// Markdown page by extension.
#[inline]
pub fn is_markdown(path: &Path) -> bool {
    matches!(extension_lower(path).as_str(), "md" | "markdown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_extensions() {
        assert_eq!(
            ChangeCategory::from_static_extension(Path::new("a/site.CSS")),
            ChangeCategory::Style
        );
        assert_eq!(
            ChangeCategory::from_static_extension(Path::new("a/app.mjs")),
            ChangeCategory::Script
        );
        assert_eq!(
            ChangeCategory::from_static_extension(Path::new("logo.svg")),
            ChangeCategory::Asset
        );
    }

    #[test]
    fn markdown_detection() {
        assert!(is_markdown(Path::new("guide.md")));
        assert!(is_markdown(Path::new("doc.markdown")));
        assert!(!is_markdown(Path::new("post.typ")));
        assert!(!is_markdown(Path::new("noext")));
    }

    #[test]
    fn copy_only_categories() {
        let copy_only: Vec<_> = ChangeCategory::ALL
            .into_iter()
            .filter(|c| c.is_copy_only())
            .collect();
        assert_eq!(
            copy_only,
            vec![ChangeCategory::Style, ChangeCategory::Script, ChangeCategory::Asset]
        );
    }
}
