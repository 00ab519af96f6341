//! Build orchestration.
//!
//! Phases of every build:
//! - **Plan** - reload config, rescan content, turn the batch into a [`RebuildPlan`]
//! - **Prepare** - full builds only: reset the session, clean the output, scan
//! - **Before build** - `before-build` hooks
//! - **Render** - one task per unit on a `JoinSet`, assets copied alongside
//! - **Virtual pages** - `virtual-pages` hooks, results written verbatim
//! - **Emit** - sitemap and other site-wide files from the full page table
//! - **After build** - `after-build` hooks, failures collected into the report

use super::assets::{self, AssetOutcome};
use super::error::{BuildError, FailureKind, UnitFailure};
use super::page::{UnitContext, render_unit};
use super::report::{BuildKind, BuildReport};
use super::session::BuildSession;
use crate::config::{ConfigHandle, SiteConfig};
use crate::content::{ContentRegistry, url_for};
use crate::core::BuildMode;
use crate::freshness::write_if_changed;
use crate::generator::default_emitters;
use crate::hooks::{
    BuildInfo, BuildSummary, ConfigPluginLoader, HookContext, HookEvent, HookPayload,
    HookPipeline, PluginLoader, VirtualPage,
};
use crate::logger::ProgressLine;
use crate::page::{PageSource, PageStatus, RenderedPage};
use crate::reload::{ChangeSet, ClassifyRoots, FullReason, RebuildPlan, TemplatePolicy, plan};
use crate::render::{ContentParser, MarkdownParser, Renderer, TemplateRenderer};
use crate::utils::plural_count;
use crate::{debug, log};
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

type SharedHooks = Arc<tokio::sync::Mutex<HookContext>>;

/// Drives full and incremental builds against one [`BuildSession`].
pub struct BuildOrchestrator {
    config: ConfigHandle,
    mode: BuildMode,
    parser: Arc<dyn ContentParser>,
    /// `None` renders with a [`TemplateRenderer`] over the configured template dirs.
    renderer: Option<Arc<dyn Renderer>>,
    loader: Arc<dyn PluginLoader>,
    session: BuildSession,
    quiet: bool,
}

impl BuildOrchestrator {
    pub fn new(config: ConfigHandle, mode: BuildMode) -> Self {
        Self {
            config,
            mode,
            parser: Arc::new(MarkdownParser),
            renderer: None,
            loader: Arc::new(ConfigPluginLoader),
            session: BuildSession::new(),
            quiet: false,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn ContentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn PluginLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Suppress the progress line.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    #[inline]
    pub fn config(&self) -> Arc<SiteConfig> {
        self.config.get()
    }

    #[inline]
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    #[cfg(test)]
    pub fn session(&self) -> &BuildSession {
        &self.session
    }

    /// Classifier roots of the live config.
    pub fn classify_roots(&self) -> ClassifyRoots {
        ClassifyRoots::from_config(&self.config())
    }

    /// Build everything from scratch.
    pub async fn full(&mut self) -> Result<BuildReport, BuildError> {
        self.execute(RebuildPlan::Full(FullReason::Initial), &ChangeSet::default())
            .await
    }

    /// Rebuild what a batch of changes affects.
    pub async fn incremental(&mut self, changes: &ChangeSet) -> Result<BuildReport, BuildError> {
        let plan = self.plan_changes(changes)?;
        debug!("build"; "{} -> {}", changes.summary(), describe(&plan));
        self.execute(plan, changes).await
    }

    /// Full build after a fatal error.
    ///
    /// The config is reloaded first; the error may have come from it.
    pub async fn recover(&mut self) -> Result<BuildReport, BuildError> {
        self.reload_config()?;
        self.full().await
    }

    fn reload_config(&self) -> Result<(), BuildError> {
        match self.config.reload() {
            Ok(true) => log!("config"; "reloaded"),
            Ok(false) => debug!("config"; "content unchanged"),
            Err(err) => return Err(BuildError::Config(err)),
        }
        Ok(())
    }

    /// Decide what a batch of changes requires.
    ///
    /// A config change reloads the config first. Content changes rescan the
    /// registry; a different set of pages escalates to a full build.
    pub fn plan_changes(&mut self, changes: &ChangeSet) -> Result<RebuildPlan, BuildError> {
        if !changes.config.is_empty() {
            self.reload_config()?;
        }

        let config = self.config();
        if changes.config.is_empty() && changes.plugin.is_empty() && !changes.content.is_empty() {
            let rescanned = scan_registry(&config)?;
            if rescanned.signature() != self.session.registry().signature() {
                return Ok(RebuildPlan::Full(FullReason::ContentStructure));
            }
            self.session.set_registry(rescanned);
        }

        let registry = self.session.registry();
        let graph = self.session.graph();
        let graph = graph.lock();
        Ok(plan(
            changes,
            &graph,
            &registry,
            &TemplatePolicy::from_config(&config),
        ))
    }

    /// Run `plan`. `changes` supplies the asset paths of incremental builds.
    pub async fn execute(
        &mut self,
        plan: RebuildPlan,
        changes: &ChangeSet,
    ) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let config = self.config();
        self.session.begin_cycle();
        let plan = self.with_retries(plan);

        let (kind, units, asset_jobs, mut assets) = match plan {
            RebuildPlan::Full(reason) => {
                self.prepare_full(&config)?;
                let registry = self.session.registry();
                let jobs = assets::collect_all(&config, &registry);
                (BuildKind::Full(reason), registry.units(), jobs, AssetOutcome::default())
            }
            RebuildPlan::Selective(pages) => {
                let (jobs, outcome) = assets::sync_changed(&config, changes.copy_paths());
                (BuildKind::Selective, group_units(pages), jobs, outcome)
            }
            RebuildPlan::AssetCopyOnly => {
                let (jobs, outcome) = assets::sync_changed(&config, changes.copy_paths());
                (BuildKind::AssetCopyOnly, BTreeMap::new(), jobs, outcome)
            }
        };

        let registrations = self.loader.load(&config).map_err(BuildError::Plugins)?;
        let pipeline = Arc::new(HookPipeline::from_registrations(registrations));
        let hooks: SharedHooks = Arc::new(tokio::sync::Mutex::new(HookContext::new(
            Arc::clone(&config),
            self.mode,
        )));

        let page_count: usize = units.values().map(Vec::len).sum();
        {
            let info = BuildInfo {
                kind: kind.name().to_string(),
                mode: self.mode.label().to_string(),
                pages: page_count,
            };
            let mut ctx = hooks.lock().await;
            pipeline
                .execute(HookEvent::BeforeBuild, HookPayload::Build(info), &mut ctx)
                .await;
        }

        let progress = (!self.quiet && self.mode.production && page_count + asset_jobs.len() > 0)
            .then(|| {
                Arc::new(ProgressLine::new(&[
                    ("pages", page_count),
                    ("assets", asset_jobs.len()),
                ]))
            });

        let asset_count = asset_jobs.len();
        let copy = assets::spawn_copy(asset_jobs, progress.clone());

        let cx = Arc::new(UnitContext {
            config: Arc::clone(&config),
            registry: self.session.registry(),
            parser: Arc::clone(&self.parser),
            renderer: self.renderer(&config),
            pipeline: Arc::clone(&pipeline),
            hooks: Arc::clone(&hooks),
            graph: self.session.graph(),
            progress: progress.clone(),
        });
        let (pages, mut written) = self.render_units(cx, units).await;
        {
            let graph = self.session.graph();
            let graph = graph.lock();
            debug!("graph"; "{} depend on {}",
                plural_count(graph.len(), "page"),
                plural_count(graph.template_count(), "template"));
        }

        assets.merge(assets::join_copy(copy, asset_count).await);
        if let Some(progress) = progress.and_then(Arc::into_inner) {
            progress.finish();
        }
        for failure in std::mem::take(&mut assets.failures) {
            self.session.record_failure(failure);
        }

        if !matches!(kind, BuildKind::AssetCopyOnly) {
            written += self.virtual_pages(&config, &pipeline, &hooks).await;
            written += self.emit(&config).await;
        }

        let hook_failures = {
            let summary = BuildSummary {
                pages: self.session.rendered_pages(),
                errors: self.session.failures().len(),
            };
            let mut ctx = hooks.lock().await;
            pipeline
                .execute(HookEvent::AfterBuild, HookPayload::Summary(summary), &mut ctx)
                .await;
            ctx.take_failures()
        };
        for failure in hook_failures {
            self.session.record_failure(failure.into());
        }

        Ok(BuildReport {
            kind,
            pages,
            written,
            assets: assets.processed,
            elapsed: started.elapsed(),
            failures: self.session.failures().to_vec(),
        })
    }

    /// Add the units that failed last time to a partial plan.
    ///
    /// A unit that never rendered has no graph edges, so a fix to its
    /// template would otherwise select nothing.
    fn with_retries(&self, plan: RebuildPlan) -> RebuildPlan {
        let mut pages = match plan {
            RebuildPlan::Selective(pages) => pages,
            RebuildPlan::AssetCopyOnly => BTreeSet::new(),
            full => return full,
        };
        let registry = self.session.registry();
        let before = pages.len();
        for source in self.session.failed_units() {
            pages.extend(registry.pages_for_source(source));
        }
        if pages.len() > before {
            debug!("build"; "retrying {}", plural_count(pages.len() - before, "failed page"));
        }
        if pages.is_empty() {
            RebuildPlan::AssetCopyOnly
        } else {
            RebuildPlan::Selective(pages)
        }
    }

    fn renderer(&self, config: &SiteConfig) -> Arc<dyn Renderer> {
        match &self.renderer {
            Some(renderer) => Arc::clone(renderer),
            None => Arc::new(TemplateRenderer::new(config.build.template_dirs())),
        }
    }

    /// Reset the session, prepare the output directory and rescan content.
    fn prepare_full(&mut self, config: &SiteConfig) -> Result<(), BuildError> {
        let previous: Vec<PathBuf> = self
            .session
            .rendered()
            .filter(|page| page.status != PageStatus::Virtual)
            .map(|page| page.output.clone())
            .collect();
        self.session.reset();

        let output = &config.build.output;
        let output_err = |source: std::io::Error| BuildError::OutputDir {
            path: output.clone(),
            source,
        };
        if config.build.clean && output.exists() {
            debug!("build"; "cleaning {}", config.root_relative(output).display());
            std::fs::remove_dir_all(output).map_err(output_err)?;
        }
        std::fs::create_dir_all(output).map_err(output_err)?;

        let registry = scan_registry(config)?;
        debug!("scan"; "{}, {}",
            plural_count(registry.logical_count(), "page"),
            plural_count(registry.assets().len(), "asset"));
        let current: FxHashSet<PathBuf> = registry.pages().into_iter().map(|p| p.output).collect();
        for stale in previous.iter().filter(|output| !current.contains(*output)) {
            if std::fs::remove_file(stale).is_ok() {
                debug!("build"; "removed stale {}", stale.display());
            }
        }
        self.session.set_registry(registry);
        Ok(())
    }

    /// Spawn every unit and wait for all of them.
    ///
    /// Returns the number of rendered pages and of outputs written.
    async fn render_units(
        &mut self,
        cx: Arc<UnitContext>,
        units: BTreeMap<PathBuf, Vec<PageSource>>,
    ) -> (usize, usize) {
        let mut pending: FxHashSet<PathBuf> = units.keys().cloned().collect();
        let mut set = JoinSet::new();
        for (source, targets) in units {
            set.spawn(render_unit(Arc::clone(&cx), source, targets));
        }
        drop(cx);

        let (mut pages, mut written) = (0, 0);
        while let Some(result) = set.join_next().await {
            match result {
                Ok(outcome) => {
                    pending.remove(&outcome.source);
                    self.session
                        .mark_unit(&outcome.source, outcome.failures.is_empty());
                    pages += outcome.pages.len();
                    written += outcome.written;
                    for page in outcome.pages {
                        self.session.record_page(page);
                    }
                    for failure in outcome.failures {
                        self.session.record_failure(failure);
                    }
                }
                Err(err) => log!("error"; "render task failed: {}", err),
            }
        }

        // a unit that never reported back panicked
        let mut panicked: Vec<_> = pending.into_iter().collect();
        panicked.sort();
        for source in panicked {
            self.session.mark_unit(&source, false);
            self.session.record_failure(UnitFailure::new(
                FailureKind::Page,
                source,
                "render task panicked",
            ));
        }
        (pages, written)
    }

    /// Run `virtual-pages` hooks and write what they return.
    async fn virtual_pages(
        &mut self,
        config: &SiteConfig,
        pipeline: &HookPipeline,
        hooks: &SharedHooks,
    ) -> usize {
        if !pipeline.has_handlers(HookEvent::VirtualPages) {
            return 0;
        }
        let payload = {
            let mut ctx = hooks.lock().await;
            pipeline
                .execute(
                    HookEvent::VirtualPages,
                    HookPayload::VirtualPages(Vec::new()),
                    &mut ctx,
                )
                .await
        };
        let HookPayload::VirtualPages(pages) = payload else {
            return 0;
        };

        let mut written = 0;
        for page in pages {
            match self.write_virtual(config, page).await {
                Ok(changed) => written += usize::from(changed),
                Err(failure) => {
                    log!("error"; "{}", failure);
                    self.session.record_failure(failure);
                }
            }
        }
        written
    }

    async fn write_virtual(
        &mut self,
        config: &SiteConfig,
        page: VirtualPage,
    ) -> Result<bool, UnitFailure> {
        let rel = Path::new(page.path.trim_start_matches('/'));
        let inside = !rel.as_os_str().is_empty()
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !inside {
            return Err(UnitFailure::new(
                FailureKind::Hook,
                PathBuf::new(),
                format!("virtual page path `{}` is outside the output", page.path),
            ));
        }

        let output = config.build.output.join(rel);
        let changed = write_if_changed(&output, page.content.as_bytes())
            .await
            .map_err(|err| {
                UnitFailure::new(FailureKind::Hook, output.clone(), format!("failed to write: {err}"))
            })?;

        self.session.record_page(RenderedPage {
            source: None,
            locale: config.i18n.default.clone(),
            url: url_for(rel),
            output,
            title: page.title,
            status: PageStatus::Virtual,
        });
        Ok(changed)
    }

    /// Write site-wide files from the complete page table.
    async fn emit(&mut self, config: &SiteConfig) -> usize {
        let pages = self.session.rendered_pages();
        let mut written = 0;
        for emitter in default_emitters(config) {
            let path = config.build.output.join(emitter.file_name());
            let result = match emitter.emit(&pages, config) {
                Ok(text) => write_if_changed(&path, text.as_bytes())
                    .await
                    .map_err(anyhow::Error::from),
                Err(err) => Err(err),
            };
            match result {
                Ok(changed) => {
                    debug!(emitter.name(); "{}", if changed { "written" } else { "unchanged" });
                    written += usize::from(changed);
                }
                Err(err) => {
                    log!("error"; "{}: {:#}", emitter.file_name(), err);
                    self.session.record_failure(UnitFailure::new(
                        FailureKind::Emitter,
                        path,
                        format!("{err:#}"),
                    ));
                }
            }
        }
        written
    }
}

fn scan_registry(config: &SiteConfig) -> Result<ContentRegistry, BuildError> {
    Ok(ContentRegistry::scan(
        &config.build.content,
        &config.build.output,
        &config.i18n.settings(),
        config.build.max_depth,
    )?)
}

fn group_units(pages: BTreeSet<PageSource>) -> BTreeMap<PathBuf, Vec<PageSource>> {
    let mut units: BTreeMap<PathBuf, Vec<PageSource>> = BTreeMap::new();
    for page in pages {
        units.entry(page.source.clone()).or_default().push(page);
    }
    units
}

fn describe(plan: &RebuildPlan) -> String {
    match plan {
        RebuildPlan::Full(reason) => format!("full ({reason})"),
        RebuildPlan::Selective(pages) => format!("{} selected", plural_count(pages.len(), "page")),
        RebuildPlan::AssetCopyOnly => "asset copy".to_string(),
    }
}
