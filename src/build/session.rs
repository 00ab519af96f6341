//! State that lives across the builds of one process.

use super::error::UnitFailure;
use crate::compiler::DependencyGraph;
use crate::content::ContentRegistry;
use crate::page::RenderedPage;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Graph, registry and rendered pages of the running process.
///
/// Nothing here is persisted. A full build calls [`reset`](Self::reset) and
/// starts from nothing; every build calls [`begin_cycle`](Self::begin_cycle)
/// so failures never leak from one build into the next. Which units failed
/// is kept across cycles until they render cleanly.
#[derive(Default)]
pub struct BuildSession {
    graph: Arc<Mutex<DependencyGraph>>,
    registry: Arc<ContentRegistry>,
    /// Keyed by output path.
    rendered: BTreeMap<PathBuf, RenderedPage>,
    failures: Vec<UnitFailure>,
    /// Input paths of units whose last render failed.
    failed_units: BTreeSet<PathBuf>,
}

impl BuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_cycle(&mut self) {
        self.failures.clear();
    }

    pub fn reset(&mut self) {
        self.graph.lock().clear();
        self.registry = Arc::default();
        self.rendered.clear();
        self.failures.clear();
        self.failed_units.clear();
    }

    /// Shared handle for render tasks.
    pub fn graph(&self) -> Arc<Mutex<DependencyGraph>> {
        Arc::clone(&self.graph)
    }

    pub fn registry(&self) -> Arc<ContentRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn set_registry(&mut self, registry: ContentRegistry) {
        self.registry = Arc::new(registry);
    }

    pub fn record_page(&mut self, page: RenderedPage) {
        self.rendered.insert(page.output.clone(), page);
    }

    pub fn rendered(&self) -> impl Iterator<Item = &RenderedPage> {
        self.rendered.values()
    }

    pub fn rendered_pages(&self) -> Vec<RenderedPage> {
        self.rendered.values().cloned().collect()
    }

    pub fn record_failure(&mut self, failure: UnitFailure) {
        self.failures.push(failure);
    }

    pub fn failures(&self) -> &[UnitFailure] {
        &self.failures
    }

    /// Record whether the unit read from `source` rendered cleanly.
    pub fn mark_unit(&mut self, source: &Path, ok: bool) {
        if ok {
            self.failed_units.remove(source);
        } else {
            self.failed_units.insert(source.to_path_buf());
        }
    }

    pub fn failed_units(&self) -> impl Iterator<Item = &PathBuf> {
        self.failed_units.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::error::FailureKind;
    use crate::page::PageStatus;

    fn page(output: &str) -> RenderedPage {
        RenderedPage {
            source: Some("/site/content/a.md".into()),
            locale: "en".into(),
            url: "/a.html".into(),
            output: output.into(),
            title: None,
            status: PageStatus::Rendered,
        }
    }

    #[test]
    fn begin_cycle_clears_failures_only() {
        let mut session = BuildSession::new();
        session.record_page(page("/out/a.html"));
        session.record_failure(UnitFailure::new(FailureKind::Page, "/a.md", "boom"));
        session.graph().lock().record(Path::new("/a.md"), &["/t/page.html"]);

        session.mark_unit(Path::new("/a.md"), false);

        session.begin_cycle();
        assert!(session.failures().is_empty());
        assert_eq!(session.rendered().count(), 1);
        assert_eq!(session.graph().lock().len(), 1);
        assert_eq!(session.failed_units().count(), 1);
    }

    #[test]
    fn clean_render_clears_failed_unit() {
        let mut session = BuildSession::new();
        session.mark_unit(Path::new("/a.md"), false);
        session.mark_unit(Path::new("/b.md"), false);
        session.mark_unit(Path::new("/a.md"), true);

        let failed: Vec<_> = session.failed_units().collect();
        assert_eq!(failed, [&PathBuf::from("/b.md")]);

        session.reset();
        assert_eq!(session.failed_units().count(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = BuildSession::new();
        session.record_page(page("/out/a.html"));
        session.graph().lock().record(Path::new("/a.md"), &["/t/page.html"]);

        session.reset();
        assert_eq!(session.rendered().count(), 0);
        assert!(session.graph().lock().is_empty());
        assert_eq!(session.registry().logical_count(), 0);
    }
}
