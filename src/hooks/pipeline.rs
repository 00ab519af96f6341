//! Ordered hook execution with failure isolation.

use super::event::{HookEvent, HookPayload};
use crate::config::SiteConfig;
use crate::core::BuildMode;
use crate::log;
use crate::page::PageSource;
use crate::render::JsonMap;
use anyhow::Result;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A hook handler.
///
/// `Ok(Some(p))` replaces the payload, `Ok(None)` keeps it, `Err` is recorded
/// as a failure and the pipeline continues with the previous payload.
#[async_trait::async_trait]
pub trait HookHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(
        &self,
        event: HookEvent,
        payload: &HookPayload,
        ctx: &mut HookContext,
    ) -> Result<Option<HookPayload>>;
}

/// A handler bound to one event.
#[derive(Clone)]
pub struct Registration {
    pub event: HookEvent,
    pub handler: Arc<dyn HookHandler>,
}

impl Registration {
    pub fn new(event: HookEvent, handler: Arc<dyn HookHandler>) -> Self {
        Self { event, handler }
    }
}

/// A handler error recorded during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub event: HookEvent,
    pub handler: String,
    pub page: Option<PathBuf>,
    pub message: String,
}

/// Build-scoped state shared by every handler of one build.
#[derive(Debug)]
pub struct HookContext {
    pub config: Arc<SiteConfig>,
    pub mode: BuildMode,
    pub output_dir: PathBuf,
    /// Page being processed by a per-page event.
    pub page: Option<PageSource>,
    /// Free-form data handlers pass to each other.
    pub data: JsonMap,
    failures: Vec<HookFailure>,
}

impl HookContext {
    pub fn new(config: Arc<SiteConfig>, mode: BuildMode) -> Self {
        let output_dir = config.build.output.clone();
        Self {
            config,
            mode,
            output_dir,
            page: None,
            data: JsonMap::new(),
            failures: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn failures(&self) -> &[HookFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<HookFailure> {
        std::mem::take(&mut self.failures)
    }

    fn record_failure(&mut self, event: HookEvent, handler: &str, message: String) {
        let page = self.page.as_ref().map(|p| p.source.clone());
        match &page {
            Some(page) => {
                log!("hook"; "{} `{}` failed on {}: {}", event, handler, page.display(), message)
            }
            None => log!("hook"; "{} `{}` failed: {}", event, handler, message),
        }
        self.failures.push(HookFailure {
            event,
            handler: handler.to_string(),
            page,
            message,
        });
    }
}

/// Handlers per event, in registration order.
#[derive(Default, Clone)]
pub struct HookPipeline {
    handlers: FxHashMap<HookEvent, Vec<Arc<dyn HookHandler>>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registrations(registrations: impl IntoIterator<Item = Registration>) -> Self {
        let mut pipeline = Self::new();
        for registration in registrations {
            pipeline.register(registration.event, registration.handler);
        }
        pipeline
    }

    pub fn register(&mut self, event: HookEvent, handler: Arc<dyn HookHandler>) {
        self.handlers.entry(event).or_default().push(handler);
    }

    pub fn has_handlers(&self, event: HookEvent) -> bool {
        self.handlers.get(&event).is_some_and(|h| !h.is_empty())
    }

    /// Run every handler of `event` in order and return the final payload.
    ///
    /// Never fails: handler errors and payloads of the wrong variant are
    /// recorded in `ctx` and skipped.
    pub async fn execute(
        &self,
        event: HookEvent,
        payload: HookPayload,
        ctx: &mut HookContext,
    ) -> HookPayload {
        let Some(handlers) = self.handlers.get(&event) else {
            return payload;
        };

        let mut current = payload;
        for handler in handlers {
            match handler.handle(event, &current, ctx).await {
                Ok(None) => {}
                Ok(Some(next)) if event.accepts(&next) => current = next,
                Ok(Some(next)) => ctx.record_failure(
                    event,
                    handler.name(),
                    format!("returned a `{}` payload", next.kind()),
                ),
                Err(err) => ctx.record_failure(event, handler.name(), format!("{err:#}")),
            }
        }
        current
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::bail;

    /// Appends its tag to an Html payload.
    pub(crate) struct Append(pub &'static str);

    #[async_trait::async_trait]
    impl HookHandler for Append {
        fn name(&self) -> &str {
            self.0
        }

        async fn handle(
            &self,
            _event: HookEvent,
            payload: &HookPayload,
            ctx: &mut HookContext,
        ) -> Result<Option<HookPayload>> {
            let HookPayload::Html(html) = payload else {
                return Ok(None);
            };
            ctx.data.insert(self.0.into(), true.into());
            Ok(Some(HookPayload::Html(format!("{html}{}", self.0))))
        }
    }

    struct Fail;

    #[async_trait::async_trait]
    impl HookHandler for Fail {
        fn name(&self) -> &str {
            "fail"
        }

        async fn handle(
            &self,
            _event: HookEvent,
            _payload: &HookPayload,
            _ctx: &mut HookContext,
        ) -> Result<Option<HookPayload>> {
            bail!("boom")
        }
    }

    struct WrongVariant;

    #[async_trait::async_trait]
    impl HookHandler for WrongVariant {
        fn name(&self) -> &str {
            "wrong"
        }

        async fn handle(
            &self,
            _event: HookEvent,
            _payload: &HookPayload,
            _ctx: &mut HookContext,
        ) -> Result<Option<HookPayload>> {
            Ok(Some(HookPayload::Markdown("# nope".into())))
        }
    }

    struct Noop;

    #[async_trait::async_trait]
    impl HookHandler for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        async fn handle(
            &self,
            _event: HookEvent,
            _payload: &HookPayload,
            _ctx: &mut HookContext,
        ) -> Result<Option<HookPayload>> {
            Ok(None)
        }
    }

    pub(crate) fn context() -> HookContext {
        HookContext::new(Arc::new(SiteConfig::default()), BuildMode::DEVELOPMENT)
    }

    fn html(s: &str) -> HookPayload {
        HookPayload::Html(s.into())
    }

    #[tokio::test]
    async fn handlers_run_in_registration_order() {
        let mut pipeline = HookPipeline::new();
        pipeline.register(HookEvent::AfterRender, Arc::new(Append("a")));
        pipeline.register(HookEvent::AfterRender, Arc::new(Append("b")));
        pipeline.register(HookEvent::AfterRender, Arc::new(Noop));
        pipeline.register(HookEvent::AfterRender, Arc::new(Append("c")));

        let mut ctx = context();
        let out = pipeline.execute(HookEvent::AfterRender, html("x"), &mut ctx).await;

        assert_eq!(out, html("xabc"));
        assert!(ctx.failures().is_empty());
        assert_eq!(ctx.data.len(), 3);
    }

    #[tokio::test]
    async fn failing_handler_is_isolated() {
        let mut pipeline = HookPipeline::new();
        pipeline.register(HookEvent::AfterRender, Arc::new(Append("a")));
        pipeline.register(HookEvent::AfterRender, Arc::new(Fail));
        pipeline.register(HookEvent::AfterRender, Arc::new(Append("b")));

        let mut ctx = context();
        let out = pipeline.execute(HookEvent::AfterRender, html("x"), &mut ctx).await;

        assert_eq!(out, html("xab"));
        assert_eq!(ctx.failures().len(), 1);
        assert_eq!(ctx.failures()[0].handler, "fail");
        assert_eq!(ctx.failures()[0].message, "boom");
    }

    #[tokio::test]
    async fn last_handler_failing_keeps_previous_payload() {
        let mut pipeline = HookPipeline::new();
        pipeline.register(HookEvent::AfterRender, Arc::new(Append("a")));
        pipeline.register(HookEvent::AfterRender, Arc::new(Fail));

        let mut ctx = context();
        let out = pipeline.execute(HookEvent::AfterRender, html("x"), &mut ctx).await;
        assert_eq!(out, html("xa"));
    }

    #[tokio::test]
    async fn wrong_variant_is_a_failure() {
        let mut pipeline = HookPipeline::new();
        pipeline.register(HookEvent::AfterRender, Arc::new(WrongVariant));
        pipeline.register(HookEvent::AfterRender, Arc::new(Append("a")));

        let mut ctx = context();
        let out = pipeline.execute(HookEvent::AfterRender, html("x"), &mut ctx).await;

        assert_eq!(out, html("xa"));
        assert!(ctx.failures()[0].message.contains("markdown"));
    }

    #[tokio::test]
    async fn events_are_independent() {
        let pipeline = HookPipeline::from_registrations([Registration::new(
            HookEvent::AfterParse,
            Arc::new(Fail),
        )]);

        let mut ctx = context();
        let out = pipeline.execute(HookEvent::AfterRender, html("x"), &mut ctx).await;

        assert_eq!(out, html("x"));
        assert!(ctx.failures().is_empty());
        assert!(pipeline.has_handlers(HookEvent::AfterParse));
        assert!(!pipeline.has_handlers(HookEvent::AfterRender));
    }
}
