//! Sitemap generation.
//!
//! Lists every rendered page for search engine indexing. Fallback pages are
//! left out since they duplicate another locale's content.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!   </url>
//! </urlset>
//! ```

use super::Emitter;
use crate::config::SiteConfig;
use crate::page::RenderedPage;
use anyhow::Result;
use std::borrow::Cow;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Writes `sitemap.xml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SitemapEmitter;

impl Emitter for SitemapEmitter {
    fn name(&self) -> &str {
        "sitemap"
    }

    fn file_name(&self) -> &str {
        "sitemap.xml"
    }

    fn emit(&self, pages: &[RenderedPage], config: &SiteConfig) -> Result<String> {
        Ok(Sitemap::build(pages, config.site.base_url()).into_xml())
    }
}

struct Sitemap {
    urls: Vec<String>,
}

impl Sitemap {
    fn build(pages: &[RenderedPage], base_url: &str) -> Self {
        let mut urls: Vec<String> = pages
            .iter()
            .filter(|page| !page.is_fallback())
            .map(|page| format!("{}{}", base_url, page.url))
            .collect();
        urls.sort();
        urls.dedup();
        Self { urls }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(64 + self.urls.len() * 64);

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"");
        xml.push_str(SITEMAP_NS);
        xml.push_str("\">\n");

        for loc in &self.urls {
            xml.push_str("  <url>\n    <loc>");
            xml.push_str(&escape_xml(loc));
            xml.push_str("</loc>\n  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}
