//! Site-wide files generated from the final page list.
//!
//! Emitters run after every build that rendered pages and see the complete
//! page table, not only the pages of the last incremental build.

pub mod sitemap;

pub use sitemap::SitemapEmitter;

use crate::config::SiteConfig;
use crate::page::RenderedPage;
use anyhow::Result;

pub trait Emitter: Send + Sync {
    fn name(&self) -> &str;

    /// Output file, relative to the output root.
    fn file_name(&self) -> &str;

    fn emit(&self, pages: &[RenderedPage], config: &SiteConfig) -> Result<String>;
}

/// Emitters enabled by `config`.
pub fn default_emitters(config: &SiteConfig) -> Vec<Box<dyn Emitter>> {
    let mut emitters: Vec<Box<dyn Emitter>> = Vec::new();
    if config.build.sitemap {
        emitters.push(Box::new(SitemapEmitter));
    }
    emitters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn sitemap_follows_config() {
        assert_eq!(default_emitters(&test_parse_config("")).len(), 1);
        let off = test_parse_config("[build]\nsitemap = false");
        assert!(default_emitters(&off).is_empty());
    }
}
