//! `[i18n]` section configuration.
//!
//! ```toml
//! [i18n]
//! locales = ["en", "it"]
//! default = "en"
//! prefix_default = false   # serve the default locale at `/`
//! ```
//!
//! With fewer than two locales the site runs in legacy mode: every page gets
//! the default locale and no directory prefix is interpreted.

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::content::LocaleSettings;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Available locale codes, in fallback order.
    pub locales: Vec<String>,
    /// Locale whose content backs missing translations.
    pub default: String,
    /// Put the default locale under `/<default>/` too.
    pub prefix_default: bool,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            locales: Vec::new(),
            default: "en".into(),
            prefix_default: false,
        }
    }
}

impl I18nConfig {
    const LOCALES: FieldPath = FieldPath::new("i18n.locales");
    const DEFAULT: FieldPath = FieldPath::new("i18n.default");

    /// Locale settings used by the content registry.
    pub fn settings(&self) -> LocaleSettings {
        let available = if self.locales.is_empty() {
            vec![self.default.clone()]
        } else {
            self.locales.clone()
        };
        LocaleSettings::new(available, self.default.clone(), self.prefix_default)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.default.is_empty() {
            diag.error(Self::DEFAULT, "default locale must not be empty");
        }

        let mut seen = FxHashSet::default();
        for locale in &self.locales {
            if locale.is_empty() || locale.contains(['/', '\\', '.']) {
                diag.error(Self::LOCALES, format!("invalid locale code `{locale}`"));
            } else if !seen.insert(locale.as_str()) {
                diag.error(Self::LOCALES, format!("locale `{locale}` is listed twice"));
            }
        }

        if !self.locales.is_empty() && !self.locales.contains(&self.default) {
            diag.error_with_hint(
                Self::DEFAULT,
                format!("`{}` is not listed in {}", self.default, Self::LOCALES),
                format!("add \"{}\" to {}", self.default, Self::LOCALES),
            );
        }
    }
}
