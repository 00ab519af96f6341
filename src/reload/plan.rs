//! Rebuild planning.
//!
//! Decides from a [`ChangeSet`] what a build has to do. Ambiguous cases
//! escalate to a full rebuild:
//!
//! ```text
//! config ─► plugin ─► global template without dependents ─► known dependents ─► content
//!  Full      Full             Full                         Selective           Selective
//! ```
//!
//! A batch that selects no page at all only copies assets.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::classify::ChangeSet;
use crate::compiler::DependencyGraph;
use crate::config::SiteConfig;
use crate::content::ContentRegistry;
use crate::debug;
use crate::page::PageSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullReason {
    Initial,
    ConfigChanged,
    PluginChanged,
    /// A global template changed and no page is known to use it yet.
    GlobalTemplate(PathBuf),
    /// Pages were added or removed.
    ContentStructure,
    /// A changed content file is not in the registry.
    UnknownContent(PathBuf),
}

impl fmt::Display for FullReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial build"),
            Self::ConfigChanged => write!(f, "config changed"),
            Self::PluginChanged => write!(f, "plugin changed"),
            Self::GlobalTemplate(path) => {
                write!(f, "global template {} has no recorded dependents", path.display())
            }
            Self::ContentStructure => write!(f, "content structure changed"),
            Self::UnknownContent(path) => write!(f, "unknown content file {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildPlan {
    Full(FullReason),
    Selective(BTreeSet<PageSource>),
    AssetCopyOnly,
}

impl RebuildPlan {
    #[cfg(test)]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

/// Which templates are assumed to be used by every page.
#[derive(Debug, Clone, Default)]
pub struct TemplatePolicy {
    /// Explicit `build.global_templates` entries.
    pub global_templates: Vec<PathBuf>,
}

impl TemplatePolicy {
    const GLOBAL_HINTS: [&'static str; 3] = ["layout", "partial", "base"];

    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            global_templates: config.build.global_templates.clone(),
        }
    }

    /// Listed explicitly, or named like a layout, partial or base template.
    pub fn is_global(&self, template: &Path) -> bool {
        if self.global_templates.iter().any(|t| t == template) {
            return true;
        }
        // file name and its directory only, site roots may contain the hints
        let parent = template.parent().and_then(Path::file_name);
        [template.file_name(), parent]
            .into_iter()
            .flatten()
            .map(|name| name.to_string_lossy().to_lowercase())
            .any(|name| Self::GLOBAL_HINTS.iter().any(|hint| name.contains(hint)))
    }
}

/// Turn a classified batch into a rebuild plan.
pub fn plan(
    changes: &ChangeSet,
    graph: &DependencyGraph,
    registry: &ContentRegistry,
    policy: &TemplatePolicy,
) -> RebuildPlan {
    if !changes.config.is_empty() {
        return RebuildPlan::Full(FullReason::ConfigChanged);
    }
    if !changes.plugin.is_empty() {
        return RebuildPlan::Full(FullReason::PluginChanged);
    }

    let mut selected = BTreeSet::new();

    for template in &changes.template {
        let dependents = graph.dependents(template);
        if dependents.is_empty() {
            if policy.is_global(template) {
                return RebuildPlan::Full(FullReason::GlobalTemplate(template.clone()));
            }
            debug!("plan"; "template {} has no dependents", template.display());
            continue;
        }
        for source in dependents {
            selected.extend(registry.pages_for_source(&source));
        }
    }

    for content in &changes.content {
        let pages = registry.pages_for_source(content);
        if pages.is_empty() {
            return RebuildPlan::Full(FullReason::UnknownContent(content.clone()));
        }
        selected.extend(pages);
    }

    if selected.is_empty() {
        RebuildPlan::AssetCopyOnly
    } else {
        RebuildPlan::Selective(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::LocaleSettings;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        content: PathBuf,
        registry: ContentRegistry,
        graph: DependencyGraph,
        layout: PathBuf,
    }

    impl Fixture {
        fn new(locales: &[&str], files: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            let content = dir.path().join("content");
            for rel in files {
                let path = content.join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, "# page").unwrap();
            }
            let settings = LocaleSettings::new(
                locales.iter().map(|s| s.to_string()).collect(),
                "en".into(),
                false,
            );
            let registry =
                ContentRegistry::scan(&content, &dir.path().join("public"), &settings, 8).unwrap();
            let layout = dir.path().join("templates/layout.html");
            Self {
                _dir: dir,
                content,
                registry,
                graph: DependencyGraph::new(),
                layout,
            }
        }

        fn page(&self, rel: &str) -> PathBuf {
            self.content.join(rel)
        }

        fn plan(&self, changes: &ChangeSet) -> RebuildPlan {
            plan(changes, &self.graph, &self.registry, &TemplatePolicy::default())
        }
    }

    fn sources(plan: &RebuildPlan) -> BTreeSet<PathBuf> {
        match plan {
            RebuildPlan::Selective(pages) => pages.iter().map(|p| p.source.clone()).collect(),
            other => panic!("expected selective plan, got {other:?}"),
        }
    }

    #[test]
    fn content_change_selects_only_that_page() {
        let mut fx = Fixture::new(&["en"], &["index.md", "guide.md"]);
        let (index, guide) = (fx.page("index.md"), fx.page("guide.md"));
        fx.graph.record(&index, std::slice::from_ref(&fx.layout));
        fx.graph.record(&guide, std::slice::from_ref(&fx.layout));

        let mut changes = ChangeSet::default();
        changes.content.insert(guide.clone());

        assert_eq!(sources(&fx.plan(&changes)), BTreeSet::from([guide]));
    }

    #[test]
    fn shared_layout_selects_all_dependents() {
        let mut fx = Fixture::new(&["en"], &["index.md", "guide.md"]);
        let (index, guide) = (fx.page("index.md"), fx.page("guide.md"));
        fx.graph.record(&index, std::slice::from_ref(&fx.layout));
        fx.graph.record(&guide, std::slice::from_ref(&fx.layout));

        let mut changes = ChangeSet::default();
        changes.template.insert(fx.layout.clone());

        assert_eq!(sources(&fx.plan(&changes)), BTreeSet::from([index, guide]));
    }

    #[test]
    fn layout_without_dependents_is_full() {
        let fx = Fixture::new(&["en"], &["index.md", "guide.md"]);
        let mut changes = ChangeSet::default();
        changes.template.insert(fx.layout.clone());

        assert_eq!(
            fx.plan(&changes),
            RebuildPlan::Full(FullReason::GlobalTemplate(fx.layout.clone()))
        );
    }

    #[test]
    fn explicit_global_template_without_dependents_is_full() {
        let fx = Fixture::new(&["en"], &["index.md"]);
        let footer = PathBuf::from("/site/templates/footer.html");
        let policy = TemplatePolicy {
            global_templates: vec![footer.clone()],
        };
        let mut changes = ChangeSet::default();
        changes.template.insert(footer.clone());

        assert!(plan(&changes, &fx.graph, &fx.registry, &policy).is_full());
        assert_eq!(
            plan(&changes, &fx.graph, &fx.registry, &TemplatePolicy::default()),
            RebuildPlan::AssetCopyOnly
        );
    }

    #[test]
    fn config_always_wins() {
        let mut fx = Fixture::new(&["en"], &["index.md"]);
        let index = fx.page("index.md");
        fx.graph.record(&index, std::slice::from_ref(&fx.layout));

        let mut changes = ChangeSet::default();
        changes.content.insert(index);
        changes.template.insert(fx.layout.clone());
        changes.plugin.insert("/site/plugins/x.py".into());
        changes.asset.insert("/site/static/a.png".into());
        changes.config.insert("/site/vellum.toml".into());

        assert_eq!(fx.plan(&changes), RebuildPlan::Full(FullReason::ConfigChanged));
    }

    #[test]
    fn plugin_change_is_full() {
        let fx = Fixture::new(&["en"], &["index.md"]);
        let mut changes = ChangeSet::default();
        changes.content.insert(fx.page("index.md"));
        changes.plugin.insert("/site/plugins/x.py".into());

        assert_eq!(fx.plan(&changes), RebuildPlan::Full(FullReason::PluginChanged));
    }

    #[test]
    fn assets_only_copy() {
        let fx = Fixture::new(&["en"], &["index.md"]);
        let mut changes = ChangeSet::default();
        for i in 0..50 {
            changes.asset.insert(PathBuf::from(format!("/site/static/img/{i}.png")));
        }

        assert_eq!(fx.plan(&changes), RebuildPlan::AssetCopyOnly);
    }

    #[test]
    fn content_change_includes_fallbacks() {
        let fx = Fixture::new(&["en", "it"], &["en/page.md"]);
        let mut changes = ChangeSet::default();
        changes.content.insert(fx.page("en/page.md"));

        let RebuildPlan::Selective(pages) = fx.plan(&changes) else {
            panic!("expected selective plan");
        };
        let locales: Vec<_> = pages.iter().map(|p| p.locale.as_str()).collect();
        assert_eq!(pages.len(), 2);
        assert!(locales.contains(&"en") && locales.contains(&"it"));
    }

    #[test]
    fn unknown_content_is_full() {
        let fx = Fixture::new(&["en"], &["index.md"]);
        let mut changes = ChangeSet::default();
        changes.content.insert(fx.page("new.md"));

        assert!(matches!(
            fx.plan(&changes),
            RebuildPlan::Full(FullReason::UnknownContent(_))
        ));
    }

    #[test]
    fn heuristic_names() {
        let policy = TemplatePolicy::default();
        assert!(policy.is_global(Path::new("/t/layout.html")));
        assert!(policy.is_global(Path::new("/t/partials/nav.html")));
        assert!(policy.is_global(Path::new("/t/Base.html")));
        assert!(!policy.is_global(Path::new("/t/page.html")));
    }
}
