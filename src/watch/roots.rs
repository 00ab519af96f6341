//! Watched directories and their re-attachment.

use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use crate::config::SiteConfig;
use crate::debug;

/// Directories the watcher should follow.
///
/// Roots that do not exist yet, or were deleted and recreated, are attached
/// on the next [`maintain`](Self::maintain).
pub(super) struct WatchRoots {
    desired: Vec<(PathBuf, RecursiveMode)>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn from_config(config: &SiteConfig) -> Self {
        Self {
            desired: desired_roots(config),
            attached: FxHashSet::default(),
        }
    }

    /// Follow a reloaded config. Roots that left it are unwatched.
    pub(super) fn update(&mut self, config: &SiteConfig, watcher: &mut RecommendedWatcher) {
        let desired = desired_roots(config);
        if desired == self.desired {
            return;
        }
        self.attached.retain(|path| {
            if desired.iter().any(|(p, _)| p == path) {
                return true;
            }
            let _ = watcher.unwatch(path);
            debug!("watch"; "detached {}", path.display());
            false
        });
        self.desired = desired;
        self.maintain(watcher);
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for (path, mode) in &self.desired {
            if !path.exists() {
                continue;
            }
            watcher.watch(path, *mode)?;
            self.attached.insert(path.clone());
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        self.attached.retain(|path| path.exists());

        for (path, mode) in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            if watcher.watch(path, *mode).is_ok() {
                self.attached.insert(path.clone());
                debug!("watch"; "re-attached watch: {}", path.display());
            }
        }
    }

    pub(super) fn len(&self) -> usize {
        self.attached.len()
    }
}

/// Content, templates, styles, static dirs and plugins recursively; the
/// config file's directory on its own, since editors replace the file on
/// save. Nested roots are dropped when a parent already covers them.
fn desired_roots(config: &SiteConfig) -> Vec<(PathBuf, RecursiveMode)> {
    let build = &config.build;
    let mut recursive = vec![build.content.clone()];
    recursive.extend(build.template_dirs());
    recursive.push(build.styles.clone());
    recursive.extend(build.static_dirs());
    recursive.push(build.plugins.clone());

    recursive.retain(|p| !p.as_os_str().is_empty());
    recursive.sort();
    recursive.dedup();
    let nested: Vec<bool> = recursive
        .iter()
        .map(|p| recursive.iter().any(|q| q != p && p.starts_with(q)))
        .collect();
    let mut roots: Vec<(PathBuf, RecursiveMode)> = recursive
        .into_iter()
        .zip(nested)
        .filter_map(|(p, nested)| (!nested).then_some((p, RecursiveMode::Recursive)))
        .collect();

    if let Some(dir) = config.config_path.parent()
        && !dir.as_os_str().is_empty()
        && !roots.iter().any(|(p, _)| dir.starts_with(p))
    {
        roots.push((dir.to_path_buf(), RecursiveMode::NonRecursive));
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::tests::Site;

    #[test]
    fn roots_cover_every_source_dir() {
        let site = Site::bilingual();
        let config = site.config();
        let roots = desired_roots(&config);
        let has = |path: &PathBuf, mode: RecursiveMode| roots.contains(&(path.clone(), mode));

        assert!(has(&site.root().to_path_buf(), RecursiveMode::NonRecursive));
        assert!(has(&config.build.content, RecursiveMode::Recursive));
        assert!(has(&site.templates(), RecursiveMode::Recursive));
        assert!(has(&config.build.styles, RecursiveMode::Recursive));
        assert!(!roots.iter().any(|(r, _)| r.starts_with(site.output())));
    }

    #[test]
    fn nested_roots_are_collapsed() {
        let site = Site::bilingual();
        site.append_config("[build]\nstatic = \"content/files\"\n");
        let config = site.config();
        let roots = desired_roots(&config);

        assert!(roots.contains(&(config.build.content.clone(), RecursiveMode::Recursive)));
        assert!(!roots.iter().any(|(r, _)| r.ends_with("content/files")));
    }
}
