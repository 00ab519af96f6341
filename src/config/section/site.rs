//! `[site]` section configuration.

use serde::{Deserialize, Serialize};

/// Site metadata available to templates and emitters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Site title (`{{ site_title }}` in templates).
    pub title: String,
    /// Public base URL, used for absolute sitemap locations.
    pub url: Option<String>,
}

impl SiteSectionConfig {
    /// Base URL without trailing slash, empty when unset.
    pub fn base_url(&self) -> &str {
        self.url.as_deref().unwrap_or_default().trim_end_matches('/')
    }
}
