//! Rendering collaborators.
//!
//! The build drives two seams:
//!
//! - [`ContentParser`]: raw page text → [`ParsedDocument`]
//! - [`Renderer`]: [`PageContext`] → [`Rendered`] html plus the template
//!   files the render read
//!
//! [`MarkdownParser`] and [`TemplateRenderer`] are the implementations the
//! binary ships with.

mod markdown;
mod template;

pub use markdown::MarkdownParser;
pub use template::TemplateRenderer;

use crate::content::Translation;
use crate::page::PageSource;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A JSON object map for front matter and hook data.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Heading entry of a table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Output of a [`ContentParser`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub html: String,
    #[serde(default)]
    pub front_matter: JsonMap,
    #[serde(default)]
    pub toc: Vec<TocEntry>,
    #[serde(default)]
    pub title: Option<String>,
}

pub trait ContentParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<ParsedDocument>;
}

/// Everything a template sees for one page.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub page: PageSource,
    pub document: ParsedDocument,
    pub site_title: String,
    pub base_url: String,
    pub translations: Vec<Translation>,
}

impl PageContext {
    /// Front matter `template`, or `page.html`.
    pub fn template_name(&self) -> &str {
        self.document
            .front_matter
            .get("template")
            .and_then(|v| v.as_str())
            .unwrap_or("page.html")
    }

    pub fn title(&self) -> &str {
        self.document
            .title
            .as_deref()
            .unwrap_or(&self.site_title)
    }
}

/// Html of one render and the template files it read.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub dependencies: Vec<PathBuf>,
}

#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, ctx: &PageContext) -> Result<Rendered>;
}
