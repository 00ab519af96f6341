//! Lifecycle events and their payloads.

use crate::page::RenderedPage;
use crate::render::ParsedDocument;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle point a handler subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEvent {
    BeforeBuild,
    BeforeParse,
    AfterParse,
    AfterRender,
    VirtualPages,
    AfterBuild,
}

impl HookEvent {
    #[cfg(test)]
    pub const ALL: [Self; 6] = [
        Self::BeforeBuild,
        Self::BeforeParse,
        Self::AfterParse,
        Self::AfterRender,
        Self::VirtualPages,
        Self::AfterBuild,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::BeforeBuild => "before-build",
            Self::BeforeParse => "before-parse",
            Self::AfterParse => "after-parse",
            Self::AfterRender => "after-render",
            Self::VirtualPages => "virtual-pages",
            Self::AfterBuild => "after-build",
        }
    }

    /// Whether `payload` is the variant this event carries.
    pub fn accepts(self, payload: &HookPayload) -> bool {
        matches!(
            (self, payload),
            (Self::BeforeBuild, HookPayload::Build(_))
                | (Self::BeforeParse, HookPayload::Markdown(_))
                | (Self::AfterParse, HookPayload::Document(_))
                | (Self::AfterRender, HookPayload::Html(_))
                | (Self::VirtualPages, HookPayload::VirtualPages(_))
                | (Self::AfterBuild, HookPayload::Summary(_))
        )
    }

    /// Per-page events run with `HookContext::page` set.
    pub fn is_page_event(self) -> bool {
        matches!(self, Self::BeforeParse | Self::AfterParse | Self::AfterRender)
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload threaded through the handlers of one event.
///
/// Serialized as `{"kind": "...", "value": ...}` for command plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum HookPayload {
    Build(BuildInfo),
    Markdown(String),
    Document(ParsedDocument),
    Html(String),
    VirtualPages(Vec<VirtualPage>),
    Summary(BuildSummary),
}

impl HookPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Markdown(_) => "markdown",
            Self::Document(_) => "document",
            Self::Html(_) => "html",
            Self::VirtualPages(_) => "virtual-pages",
            Self::Summary(_) => "summary",
        }
    }
}

/// `before-build` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// `full`, `selective` or `assets`.
    pub kind: String,
    /// `build` or `watch`.
    pub mode: String,
    /// Render targets in this build.
    pub pages: usize,
}

/// Extra page contributed by a `virtual-pages` handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualPage {
    /// Output path relative to the output root, e.g. `tags/index.html`.
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// `after-build` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub pages: Vec<RenderedPage>,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_kebab_case() {
        for event in HookEvent::ALL {
            let json = serde_json::to_string(&event).unwrap();
            assert_eq!(json, format!("\"{}\"", event.name()));
        }
    }

    #[test]
    fn payload_wire_format() {
        let payload = HookPayload::Html("<p>hi</p>".into());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "html", "value": "<p>hi</p>"}));

        let back: HookPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn events_accept_only_their_variant() {
        let html = HookPayload::Html(String::new());
        assert!(HookEvent::AfterRender.accepts(&html));
        assert!(!HookEvent::BeforeParse.accepts(&html));
        assert!(HookEvent::VirtualPages.accepts(&HookPayload::VirtualPages(vec![])));
    }
}
