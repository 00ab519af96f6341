//! Bounded content walk.
//!
//! One jwalk pass over the content root. Every entry goes through
//! [`check_candidate`] before anything else looks at it.

use super::locale::{LocaleSettings, depth_of, url_for};
use crate::core::is_markdown;
use crate::page::PageSource;
use crate::{debug, log};
use jwalk::WalkDir;
use rustc_hash::FxHashSet;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("content root `{path}` is not readable")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path `{0}` escapes the content root")]
    Traversal(PathBuf),

    #[error("path `{0}` contains a NUL byte")]
    NulByte(PathBuf),

    #[error("directory `{path}` is deeper than build.max_depth ({max}), possible symlink cycle")]
    DepthExceeded { path: PathBuf, max: usize },
}

/// Result of one content walk.
#[derive(Debug, Default)]
pub struct Scan {
    /// Real (non-fallback) pages, in walk order.
    pub pages: Vec<PageSource>,
    /// Non-markdown files under the content root.
    pub assets: Vec<PathBuf>,
}

/// Reject paths that must never reach the build.
pub fn check_candidate(path: &Path, root: &Path) -> Result<(), ScanError> {
    if path.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(ScanError::NulByte(path.to_path_buf()));
    }
    if path.components().any(|c| c == Component::ParentDir) || !path.starts_with(root) {
        return Err(ScanError::Traversal(path.to_path_buf()));
    }
    Ok(())
}

/// Directory levels of `path` below `root` (a direct child is level 1).
fn level_below(path: &Path, root: &Path) -> usize {
    path.strip_prefix(root)
        .map(|rel| rel.components().count())
        .unwrap_or(0)
}

fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name.to_string_lossy().starts_with('.')))
}

/// Walk `root` and collect pages and content assets.
///
/// Directories nested deeper than `max_depth` abort the scan. Duplicate
/// `(locale, logical)` pairs keep the first file in walk order.
pub fn scan(
    root: &Path,
    output_root: &Path,
    settings: &LocaleSettings,
    max_depth: usize,
) -> Result<Scan, ScanError> {
    std::fs::read_dir(root).map_err(|source| ScanError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    let mut result = Scan::default();
    let mut seen: FxHashSet<(String, PathBuf)> = FxHashSet::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .skip_hidden(false)
        .sort(true)
        .max_depth(max_depth + 1);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log!("warn"; "skipping unreadable entry: {}", err);
                continue;
            }
        };
        let path = entry.path();
        if path == root {
            continue;
        }

        check_candidate(&path, root)?;

        let Ok(relative) = path.strip_prefix(root).map(Path::to_path_buf) else {
            return Err(ScanError::Traversal(path));
        };
        if is_hidden(&relative) {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            debug!("scan"; "skipping symlink {}", relative.display());
            continue;
        }
        if file_type.is_dir() {
            if level_below(&path, root) > max_depth {
                return Err(ScanError::DepthExceeded {
                    path,
                    max: max_depth,
                });
            }
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        if !is_markdown(&path) {
            result.assets.push(path);
            continue;
        }

        let (locale, logical) = settings.detect(&relative);
        if !seen.insert((locale.clone(), logical.clone())) {
            log!("warn"; "duplicate page {}:{} at {}, keeping the first",
                locale, logical.display(), relative.display());
            continue;
        }

        let output_relative = settings.page_output(&locale, &logical);
        result.pages.push(PageSource {
            source: path,
            url: url_for(&output_relative),
            depth: depth_of(&output_relative),
            output: output_root.join(&output_relative),
            locale,
            logical,
            fallback_from: None,
        });
    }

    Ok(result)
}
