//! Site configuration for `vellum.toml`.
//!
//! ```text
//! config/
//! ├── section/   # [site], [build], [i18n], [watch], [[plugins]]
//! ├── types/     # ConfigError, diagnostics, live ConfigHandle
//! └── mod.rs     # SiteConfig (this file)
//! ```
//!
//! Relative paths are resolved against the directory holding the config
//! file, so `vellum build` works from any subdirectory of the site.

pub mod section;
pub mod types;
mod util;

pub use section::{BuildSectionConfig, I18nConfig, PluginConfig, SiteSectionConfig, WatchConfig};
pub use types::{ConfigDiagnostics, ConfigError, ConfigHandle, FieldPath};
pub use util::find_config_file;

use crate::log;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure representing `vellum.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site root: parent directory of the config file.
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteSectionConfig,

    #[serde(default)]
    pub build: BuildSectionConfig,

    #[serde(default)]
    pub i18n: I18nConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

/// Command-line values that take precedence over the file.
///
/// Kept by [`ConfigHandle`] so a reload during watch re-applies them.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub content: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub clean: bool,
}

impl SiteConfig {
    /// Read, resolve and validate the config at `path`.
    pub fn load(path: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::warn_unknown_fields(&ignored, path);
        }

        config.config_path = crate::utils::path::normalize_path(path);
        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.apply_overrides(overrides);
        config.build.normalize(&root);
        config.root = root;

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn warn_unknown_fields(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warn"; "ignoring unknown fields in {}: {}", display_path, fields.join(", "));
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(content) = &overrides.content {
            self.build.content = content.clone();
        }
        if let Some(output) = &overrides.output {
            self.build.output = output.clone();
        }
        self.build.clean |= overrides.clean;
    }

    /// Collect every validation error and report them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.build.validate(&mut diag);
        self.i18n.validate(&mut diag);
        for plugin in &self.plugins {
            plugin.validate(&mut diag);
        }
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Path relative to the site root, for log lines.
    pub fn root_relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Parse an inline config without touching the filesystem.
/// Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(SiteConfig::parse_with_ignored("[site\ntitle = \"Docs\"").is_err());
    }

    #[test]
    fn unknown_fields_detected() {
        let content = "[site]\ntitle = \"Docs\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.site.title, "Docs");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn load_resolves_paths_against_config_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        let path = dir.path().join("vellum.toml");
        fs::write(&path, "[build]\ncontent = \"docs\"\noutput = \"site\"\n").unwrap();

        let config = SiteConfig::load(&path, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.root, config.config_path.parent().unwrap());
        assert_eq!(config.build.content, config.root.join("docs"));
        assert_eq!(config.build.output, config.root.join("site"));
    }

    #[test]
    fn overrides_take_precedence() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pages")).unwrap();
        let path = dir.path().join("vellum.toml");
        fs::write(&path, "").unwrap();

        let overrides = ConfigOverrides {
            content: Some("pages".into()),
            output: None,
            clean: true,
        };
        let config = SiteConfig::load(&path, &overrides).unwrap();
        assert!(config.build.content.ends_with("pages"));
        assert!(config.build.clean);
    }

    #[test]
    fn validation_errors_are_collected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vellum.toml");
        fs::write(
            &path,
            "[build]\nmax_depth = 0\n[i18n]\nlocales = [\"en\", \"it\"]\ndefault = \"de\"\n",
        )
        .unwrap();

        let err = SiteConfig::load(&path, &ConfigOverrides::default()).unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        // max_depth, missing content dir, unlisted default
        assert_eq!(diag.errors().len(), 3);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = SiteConfig::load(&dir.path().join("vellum.toml"), &ConfigOverrides::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFound(_))
        ));
    }
}
