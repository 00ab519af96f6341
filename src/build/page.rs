//! Rendering of one unit: an input file and every variant rendered from it.
//!
//! ```text
//! read ─▶ before-parse ─▶ parse ─▶ after-parse ─┬─▶ render ─▶ after-render ─▶ write   (own locale)
//!                                               └─▶ render ─▶ after-render ─▶ write   (each fallback)
//! ```
//!
//! The unit owns one graph node, keyed by its input path. The node is
//! replaced with the union of the templates every successful variant read;
//! a unit whose variants all failed keeps its previous edges so a later fix
//! to a template still finds it.

use super::error::{FailureKind, UnitFailure};
use crate::compiler::DependencyGraph;
use crate::config::SiteConfig;
use crate::content::ContentRegistry;
use crate::freshness::write_if_changed;
use crate::hooks::{HookContext, HookEvent, HookPayload, HookPipeline};
use crate::logger::ProgressLine;
use crate::page::{PageSource, RenderedPage};
use crate::render::{ContentParser, PageContext, Renderer};
use crate::utils::path::normalize_path;
use crate::{debug, log};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a render task shares with its siblings.
pub(super) struct UnitContext {
    pub config: Arc<SiteConfig>,
    pub registry: Arc<ContentRegistry>,
    pub parser: Arc<dyn ContentParser>,
    pub renderer: Arc<dyn Renderer>,
    pub pipeline: Arc<HookPipeline>,
    pub hooks: Arc<tokio::sync::Mutex<HookContext>>,
    pub graph: Arc<Mutex<DependencyGraph>>,
    pub progress: Option<Arc<ProgressLine>>,
}

impl UnitContext {
    /// Run a per-page event with `page` as the current page.
    async fn page_hook(&self, event: HookEvent, page: &PageSource, payload: HookPayload) -> HookPayload {
        if !self.pipeline.has_handlers(event) {
            return payload;
        }
        let mut hooks = self.hooks.lock().await;
        hooks.page = Some(page.clone());
        let payload = self.pipeline.execute(event, payload, &mut hooks).await;
        hooks.page = None;
        payload
    }

    fn tick(&self) {
        if let Some(progress) = &self.progress {
            progress.inc("pages");
        }
    }
}

/// Result of one unit.
#[derive(Debug, Default)]
pub(super) struct UnitOutcome {
    pub source: PathBuf,
    pub pages: Vec<RenderedPage>,
    /// Outputs whose content actually changed on disk.
    pub written: usize,
    pub failures: Vec<UnitFailure>,
}

impl UnitOutcome {
    fn new(source: PathBuf) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    fn fail(mut self, message: impl Into<String>) -> Self {
        let failure = UnitFailure::new(FailureKind::Page, self.source.clone(), message);
        log!("error"; "{}: {}", failure.path.display(), failure.message);
        self.failures.push(failure);
        self
    }

    fn fail_variant(&mut self, page: &PageSource, message: String) {
        log!("error"; "{}: {}", page.display_name(), message);
        self.failures
            .push(UnitFailure::new(FailureKind::Page, page.output.clone(), message));
    }
}

/// Render every target of the unit read from `source`.
pub(super) async fn render_unit(
    cx: Arc<UnitContext>,
    source: PathBuf,
    targets: Vec<PageSource>,
) -> UnitOutcome {
    let mut outcome = UnitOutcome::new(source.clone());
    let Some(primary) = targets
        .iter()
        .find(|page| !page.is_fallback())
        .or_else(|| targets.first())
        .cloned()
    else {
        return outcome;
    };

    let raw = match tokio::fs::read_to_string(&source).await {
        Ok(raw) => raw,
        Err(err) => {
            for _ in &targets {
                cx.tick();
            }
            return outcome.fail(format!("failed to read source: {err}"));
        }
    };

    let payload = cx
        .page_hook(HookEvent::BeforeParse, &primary, HookPayload::Markdown(raw))
        .await;
    let HookPayload::Markdown(markdown) = payload else {
        return outcome.fail("before-parse produced a non-markdown payload");
    };

    let document = match cx.parser.parse(&markdown) {
        Ok(document) => document,
        Err(err) => {
            for _ in &targets {
                cx.tick();
            }
            return outcome.fail(format!("{err:#}"));
        }
    };

    let payload = cx
        .page_hook(HookEvent::AfterParse, &primary, HookPayload::Document(document))
        .await;
    let HookPayload::Document(document) = payload else {
        return outcome.fail("after-parse produced a non-document payload");
    };

    let mut dependencies: Vec<PathBuf> = Vec::new();
    let mut any_rendered = false;

    for page in &targets {
        let ctx = PageContext {
            page: page.clone(),
            document: document.clone(),
            site_title: cx.config.site.title.clone(),
            base_url: cx.config.site.base_url().to_string(),
            translations: cx.registry.translations(&page.logical),
        };

        let rendered = match cx.renderer.render(&ctx).await {
            Ok(rendered) => rendered,
            Err(err) => {
                outcome.fail_variant(page, format!("{err:#}"));
                cx.tick();
                continue;
            }
        };
        for dep in &rendered.dependencies {
            let dep = normalize_path(dep);
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }

        let payload = cx
            .page_hook(HookEvent::AfterRender, page, HookPayload::Html(rendered.html))
            .await;
        let HookPayload::Html(html) = payload else {
            outcome.fail_variant(page, "after-render produced a non-html payload".into());
            cx.tick();
            continue;
        };

        match write_if_changed(&page.output, html.as_bytes()).await {
            Ok(true) => {
                outcome.written += 1;
                debug!("page"; "wrote {}", page.url);
            }
            Ok(false) => debug!("page"; "unchanged {}", page.url),
            Err(err) => {
                outcome.fail_variant(page, format!("failed to write {}: {err}", page.output.display()));
                cx.tick();
                continue;
            }
        }

        any_rendered = true;
        outcome
            .pages
            .push(RenderedPage::from_source(page, ctx.document.title.clone()));
        cx.tick();
    }

    if any_rendered {
        cx.graph.lock().record(&source, &dependencies);
    }
    outcome
}
