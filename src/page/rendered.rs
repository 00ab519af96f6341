//! Metadata of a finished page, handed to emitters and `after-build` hooks.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::PageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageStatus {
    /// Rendered from a file in its own locale.
    Rendered,
    /// Rendered from another locale's file.
    Fallback,
    /// Injected by a `virtual-pages` hook.
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    pub source: Option<PathBuf>,
    pub locale: String,
    pub url: String,
    pub output: PathBuf,
    pub title: Option<String>,
    pub status: PageStatus,
}

impl RenderedPage {
    pub fn from_source(page: &PageSource, title: Option<String>) -> Self {
        Self {
            source: Some(page.source.clone()),
            locale: page.locale.clone(),
            url: page.url.clone(),
            output: page.output.clone(),
            title,
            status: if page.is_fallback() {
                PageStatus::Fallback
            } else {
                PageStatus::Rendered
            },
        }
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.status == PageStatus::Fallback
    }
}
