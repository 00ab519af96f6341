//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"
//! output = "public"
//! templates = "templates"
//! theme = "themes/plain"        # provides templates/ and static/
//! static = "static"
//! styles = "styles"
//! plugins = "plugins"
//! max_depth = 32
//! global_templates = ["templates/site.html"]
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::resolve_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Markdown content root.
    pub content: PathBuf,
    /// Output directory.
    pub output: PathBuf,
    /// Site templates and partials.
    pub templates: PathBuf,
    /// Optional theme directory with `templates/` and `static/`.
    pub theme: Option<PathBuf>,
    /// Static files copied verbatim to the output root.
    #[serde(rename = "static")]
    pub static_dir: PathBuf,
    /// Stylesheets copied to `<output>/styles`.
    pub styles: PathBuf,
    /// Plugin sources; any change here forces a full rebuild.
    pub plugins: PathBuf,
    /// Deepest directory level accepted under the content root.
    pub max_depth: usize,
    /// Emit `sitemap.xml` after each build.
    pub sitemap: bool,
    /// Remove the output directory before a full build.
    pub clean: bool,
    /// Templates used by every page; changing one always rebuilds everything.
    pub global_templates: Vec<PathBuf>,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            content: "content".into(),
            output: "public".into(),
            templates: "templates".into(),
            theme: None,
            static_dir: "static".into(),
            styles: "styles".into(),
            plugins: "plugins".into(),
            max_depth: 32,
            sitemap: true,
            clean: false,
            global_templates: Vec::new(),
        }
    }
}

impl BuildSectionConfig {
    const MAX_DEPTH: FieldPath = FieldPath::new("build.max_depth");
    const CONTENT: FieldPath = FieldPath::new("build.content");

    /// Resolve every configured path against the site root.
    pub fn normalize(&mut self, root: &Path) {
        self.content = resolve_path(&self.content, root);
        self.output = resolve_path(&self.output, root);
        self.templates = resolve_path(&self.templates, root);
        self.static_dir = resolve_path(&self.static_dir, root);
        self.styles = resolve_path(&self.styles, root);
        self.plugins = resolve_path(&self.plugins, root);
        self.theme = self.theme.take().map(|t| resolve_path(&t, root));
        self.global_templates = self
            .global_templates
            .iter()
            .map(|p| resolve_path(p, root))
            .collect();
    }

    /// Template directories in lookup order (site first, then theme).
    pub fn template_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.templates.clone()];
        if let Some(theme) = &self.theme {
            dirs.push(theme.join("templates"));
        }
        dirs
    }

    /// Static directories in copy order (theme first so the site wins).
    pub fn static_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(theme) = &self.theme {
            dirs.push(theme.join("static"));
        }
        dirs.push(self.static_dir.clone());
        dirs
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_depth == 0 {
            diag.error(Self::MAX_DEPTH, "must be greater than 0");
        }
        if !self.content.is_dir() {
            diag.error_with_hint(
                Self::CONTENT,
                format!("content directory not found: {}", self.content.display()),
                "create it or point `build.content` at your markdown files",
            );
        }
    }
}
