//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_path`)

pub mod fs;

pub use fs::{normalize_path, resolve_path};

use std::path::Path;

/// Lowercased extension of a path, empty when absent.
#[inline]
pub fn extension_lower(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Join path components with `/` regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_lower(Path::new("a/B.MD")), "md");
        assert_eq!(extension_lower(Path::new("noext")), "");
    }

    #[test]
    fn to_slash_joins_components() {
        assert_eq!(to_slash(Path::new("it/guide/intro.html")), "it/guide/intro.html");
        assert_eq!(to_slash(Path::new("index.html")), "index.html");
    }
}
