//! Change classification.
//!
//! Pure function from a batch of changed paths to category buckets. No
//! filesystem access: watcher paths are normalized before they get here.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::core::{ChangeCategory, is_markdown};
use crate::utils::path::extension_lower;
use crate::{debug, log};

/// Root directories a changed path is matched against.
#[derive(Debug, Clone, Default)]
pub struct ClassifyRoots {
    pub config_path: PathBuf,
    pub content: PathBuf,
    /// Site templates first, then theme templates.
    pub templates: Vec<PathBuf>,
    pub styles: PathBuf,
    /// Theme static first, then site static.
    pub statics: Vec<PathBuf>,
    pub plugins: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    Content,
    Template,
    Style,
    Static,
    Plugin,
}

impl ClassifyRoots {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            config_path: config.config_path.clone(),
            content: config.build.content.clone(),
            templates: config.build.template_dirs(),
            styles: config.build.styles.clone(),
            statics: config.build.static_dirs(),
            plugins: config.build.plugins.clone(),
            output: config.build.output.clone(),
        }
    }

    fn roots(&self) -> impl Iterator<Item = (&Path, RootKind)> {
        std::iter::once((self.content.as_path(), RootKind::Content))
            .chain(self.templates.iter().map(|p| (p.as_path(), RootKind::Template)))
            .chain(std::iter::once((self.styles.as_path(), RootKind::Style)))
            .chain(self.statics.iter().map(|p| (p.as_path(), RootKind::Static)))
            .chain(std::iter::once((self.plugins.as_path(), RootKind::Plugin)))
    }

    /// Category of a single path, `None` when it is ignored or unknown.
    pub fn categorize(&self, path: &Path) -> Option<ChangeCategory> {
        if path == self.config_path || matches!(extension_lower(path).as_str(), "yaml" | "yml") {
            return Some(ChangeCategory::Config);
        }
        if path.starts_with(&self.output) {
            debug!("classify"; "ignoring output file {}", path.display());
            return None;
        }

        let (_, kind) = self
            .roots()
            .filter(|(root, _)| !root.as_os_str().is_empty() && path.starts_with(root))
            .max_by_key(|(root, _)| root.components().count())?;

        Some(match kind {
            RootKind::Content if is_markdown(path) => ChangeCategory::Content,
            RootKind::Content => ChangeCategory::Asset,
            RootKind::Template => ChangeCategory::Template,
            RootKind::Style => match ChangeCategory::from_static_extension(path) {
                ChangeCategory::Script => ChangeCategory::Script,
                _ => ChangeCategory::Style,
            },
            RootKind::Static => ChangeCategory::from_static_extension(path),
            RootKind::Plugin => ChangeCategory::Plugin,
        })
    }
}

/// Disjoint per-category buckets of one change batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub content: BTreeSet<PathBuf>,
    pub template: BTreeSet<PathBuf>,
    pub style: BTreeSet<PathBuf>,
    pub script: BTreeSet<PathBuf>,
    pub asset: BTreeSet<PathBuf>,
    pub plugin: BTreeSet<PathBuf>,
    pub config: BTreeSet<PathBuf>,
}

impl ChangeSet {
    pub fn bucket(&self, category: ChangeCategory) -> &BTreeSet<PathBuf> {
        match category {
            ChangeCategory::Content => &self.content,
            ChangeCategory::Template => &self.template,
            ChangeCategory::Style => &self.style,
            ChangeCategory::Script => &self.script,
            ChangeCategory::Asset => &self.asset,
            ChangeCategory::Plugin => &self.plugin,
            ChangeCategory::Config => &self.config,
        }
    }

    fn bucket_mut(&mut self, category: ChangeCategory) -> &mut BTreeSet<PathBuf> {
        match category {
            ChangeCategory::Content => &mut self.content,
            ChangeCategory::Template => &mut self.template,
            ChangeCategory::Style => &mut self.style,
            ChangeCategory::Script => &mut self.script,
            ChangeCategory::Asset => &mut self.asset,
            ChangeCategory::Plugin => &mut self.plugin,
            ChangeCategory::Config => &mut self.config,
        }
    }

    pub fn insert(&mut self, category: ChangeCategory, path: PathBuf) {
        self.bucket_mut(category).insert(path);
    }

    pub fn len(&self) -> usize {
        ChangeCategory::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Style, script and asset paths: handled by copying.
    pub fn copy_paths(&self) -> impl Iterator<Item = &PathBuf> {
        ChangeCategory::ALL
            .into_iter()
            .filter(|category| category.is_copy_only())
            .flat_map(move |category| self.bucket(category))
    }

    /// `2 content, 1 template` style summary for logs.
    pub fn summary(&self) -> String {
        ChangeCategory::ALL
            .iter()
            .filter(|c| !self.bucket(**c).is_empty())
            .map(|c| format!("{} {}", self.bucket(*c).len(), c.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Sort a batch of changed paths into category buckets.
///
/// Paths matching no root are dropped with a warning.
pub fn classify(paths: &[PathBuf], roots: &ClassifyRoots) -> ChangeSet {
    let mut changes = ChangeSet::default();
    for path in paths {
        match roots.categorize(path) {
            Some(category) => changes.insert(category, path.clone()),
            None if path.starts_with(&roots.output) => {}
            None => log!("warn"; "ignoring change outside known roots: {}", path.display()),
        }
    }
    changes
}
