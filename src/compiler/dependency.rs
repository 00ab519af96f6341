//! Page → template dependency tracking for incremental builds.
//!
//! Every render reports the template files it read. The graph keeps that set
//! per page (forward) together with the inverse (reverse) so a template change
//! can be answered with the pages that have to be re-rendered.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

type PathSet = FxHashSet<PathBuf>;
type PathSetMap = FxHashMap<PathBuf, PathSet>;

/// Bidirectional dependency graph.
///
/// # Invariants
/// - `p ∈ forward[t]` iff `t ∈ reverse[p]`: both maps are always consistent
/// - a reverse entry that becomes empty is removed
/// - self references are never stored
///
/// Paths are compared as given; callers pass normalized absolute paths.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Page source → templates it was rendered from
    forward: PathSetMap,
    /// Template → page sources that read it
    reverse: PathSetMap,
}

impl DependencyGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every outgoing edge of `page`. Unknown pages are a no-op.
    pub fn clear_node(&mut self, page: &Path) {
        let Some(old_deps) = self.forward.remove(page) else {
            return;
        };

        for dep in old_deps {
            if let Some(dependents) = self.reverse.get_mut(&dep) {
                dependents.remove(page);
                if dependents.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
    }

    /// Record one `page → template` edge.
    pub fn add_dependency(&mut self, page: &Path, template: &Path) {
        if page == template {
            return;
        }
        self.forward
            .entry(page.to_path_buf())
            .or_default()
            .insert(template.to_path_buf());
        self.reverse
            .entry(template.to_path_buf())
            .or_default()
            .insert(page.to_path_buf());
    }

    /// Replace the dependency set of `page`.
    pub fn record<P: AsRef<Path>>(&mut self, page: &Path, templates: &[P]) {
        self.clear_node(page);
        for template in templates {
            self.add_dependency(page, template.as_ref());
        }
    }

    /// Pages that were rendered from `template`. Empty when unknown.
    pub fn dependents(&self, template: &Path) -> FxHashSet<PathBuf> {
        self.reverse.get(template).cloned().unwrap_or_default()
    }

    /// Templates `page` was rendered from. Empty when unknown.
    pub fn dependencies(&self, page: &Path) -> FxHashSet<PathBuf> {
        self.forward.get(page).cloned().unwrap_or_default()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    /// Number of pages with recorded dependencies.
    #[inline]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Number of distinct templates referenced by any page.
    #[inline]
    pub fn template_count(&self) -> usize {
        self.reverse.len()
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let forward_ok = self.forward.iter().all(|(page, deps)| {
            deps.iter()
                .all(|dep| self.reverse.get(dep).is_some_and(|set| set.contains(page)))
        });
        let reverse_ok = self.reverse.iter().all(|(dep, pages)| {
            !pages.is_empty()
                && pages
                    .iter()
                    .all(|page| self.forward.get(page).is_some_and(|set| set.contains(dep)))
        });
        forward_ok && reverse_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn new_graph_is_empty() {
        let graph = DependencyGraph::new();
        assert!(graph.dependents(&path("/any.html")).is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn add_and_lookup() {
        let mut graph = DependencyGraph::new();
        let page = path("/site/content/index.md");
        let layout = path("/site/templates/layout.html");

        graph.add_dependency(&page, &layout);

        assert!(graph.dependents(&layout).contains(&page));
        assert!(graph.dependencies(&page).contains(&layout));
        assert!(graph.is_consistent());
    }

    #[test]
    fn self_reference_excluded() {
        let mut graph = DependencyGraph::new();
        let page = path("/site/content/index.md");
        let layout = path("/site/templates/layout.html");

        graph.record(&page, &[page.clone(), layout.clone()]);

        assert!(graph.dependents(&page).is_empty());
        assert_eq!(graph.dependencies(&page).len(), 1);
    }

    #[test]
    fn record_replaces_old_dependencies() {
        let mut graph = DependencyGraph::new();
        let page = path("/site/content/index.md");
        let old = path("/site/templates/old.html");
        let new = path("/site/templates/new.html");

        graph.record(&page, std::slice::from_ref(&old));
        graph.record(&page, std::slice::from_ref(&new));

        assert!(graph.dependents(&old).is_empty());
        assert!(graph.dependents(&new).contains(&page));
        assert!(graph.is_consistent());
    }

    #[test]
    fn clear_node_is_idempotent() {
        let mut graph = DependencyGraph::new();
        let page = path("/site/content/guide.md");
        let shared = path("/site/templates/layout.html");
        let other = path("/site/content/index.md");

        graph.record(&page, std::slice::from_ref(&shared));
        graph.record(&other, std::slice::from_ref(&shared));

        graph.clear_node(&page);
        graph.clear_node(&page);

        assert_eq!(graph.dependents(&shared).len(), 1);
        assert!(graph.dependencies(&page).is_empty());
        assert!(graph.is_consistent());

        graph.clear_node(&path("/never/seen.md"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn repeated_records_equal_single_record() {
        let page = path("/site/content/index.md");
        let deps = [path("/t/layout.html"), path("/t/nav.html")];

        let mut once = DependencyGraph::new();
        once.record(&page, &deps);

        let mut twice = DependencyGraph::new();
        twice.record(&page, &deps);
        twice.record(&page, &deps);

        assert_eq!(once.dependencies(&page), twice.dependencies(&page));
        assert_eq!(once.template_count(), twice.template_count());
        for dep in &deps {
            assert_eq!(once.dependents(dep), twice.dependents(dep));
        }
    }

    #[test]
    fn shared_template_has_all_dependents() {
        let mut graph = DependencyGraph::new();
        let a = path("/content/a.md");
        let b = path("/content/b.md");
        let shared = path("/templates/page.html");

        graph.record(&a, std::slice::from_ref(&shared));
        graph.record(&b, std::slice::from_ref(&shared));

        let users = graph.dependents(&shared);
        assert_eq!(users.len(), 2);
        assert!(users.contains(&a) && users.contains(&b));
    }

    #[test]
    fn clear_removes_all() {
        let mut graph = DependencyGraph::new();
        graph.record(&path("/a.md"), &[path("/t/a.html")]);
        graph.record(&path("/b.md"), &[path("/t/b.html")]);

        graph.clear();

        assert!(graph.is_empty());
        assert_eq!(graph.template_count(), 0);
    }
}
