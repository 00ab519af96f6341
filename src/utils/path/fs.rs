//! Filesystem path normalization.
//!
//! Watcher events, config roots and scanned files must compare equal when they
//! name the same file, so every path entering the build goes through
//! [`normalize_path`] first.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`). A path that no
/// longer exists (a deleted file reported by the watcher) canonicalizes its
/// parent directory instead and re-appends the file name, so it still matches
/// the canonical roots it was discovered under.
///
/// # Example
/// ```ignore
/// use vellum::utils::path::normalize_path;
/// let abs = normalize_path(Path::new("./content/guide.md"));
/// ```
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}

/// Resolve a configured path against the site root.
///
/// Absolute paths are kept; relative ones are joined with `root`. The result
/// is normalized.
#[inline]
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&root.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_becomes_absolute() {
        let normalized = normalize_path(Path::new("relative/path/file.md"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn deleted_file_keeps_canonical_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let gone = dir.path().join("gone.md");

        let normalized = normalize_path(&gone);
        assert_eq!(normalized, dir.path().canonicalize().unwrap().join("gone.md"));
    }

    #[test]
    fn resolve_joins_root() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("content")).unwrap();

        let resolved = resolve_path(Path::new("content"), dir.path());
        assert_eq!(resolved, dir.path().canonicalize().unwrap().join("content"));
    }
}
