//! Config errors and validation diagnostics.

use super::FieldPath;
use crate::log;
use crate::utils::plural_count;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("no `{0}` found here or in any parent directory")]
    NotFound(PathBuf),

    #[error("invalid TOML")]
    Toml(#[from] toml::de::Error),

    // no #[source]: the diagnostics already print every detail
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// One problem with one config field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} {}", self.field.as_str().cyan(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n    {} {}", "hint:".yellow(), hint)?;
        }
        Ok(())
    }
}

/// Problems found while validating a whole config.
///
/// Errors fail the load and are reported together. Hints never fail it; they
/// are logged when validation finishes.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    errors: Vec<ConfigDiagnostic>,
    hints: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.errors.push(ConfigDiagnostic {
            field,
            message: message.into(),
            hint: None,
        });
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.errors.push(ConfigDiagnostic {
            field,
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn hint(&mut self, field: FieldPath, message: impl Into<String>) {
        self.hints.push(ConfigDiagnostic {
            field,
            message: message.into(),
            hint: None,
        });
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ConfigDiagnostic] {
        &self.errors
    }

    pub fn hints(&self) -> &[ConfigDiagnostic] {
        &self.hints
    }

    /// Log the hints, then fail if any error was recorded.
    pub fn into_result(mut self) -> Result<(), Self> {
        for hint in self.hints.drain(..) {
            log!("hint"; "{}: {}", hint.field.as_str(), hint.message);
        }
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            "invalid config".red().bold(),
            plural_count(self.errors.len(), "error")
        )?;
        for diagnostic in &self.errors {
            write!(f, "\n{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn io_error_names_file() {
        let io_err = ConfigError::Io(
            PathBuf::from("vellum.toml"),
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(io_err.to_string().contains("vellum.toml"));
    }

    #[test]
    fn errors_are_reported_together() {
        let mut diag = ConfigDiagnostics::new();
        diag.error(FieldPath::new("build.max_depth"), "must be greater than 0");
        diag.error_with_hint(
            FieldPath::new("i18n.default"),
            "`fr` is not listed in `i18n.locales`",
            "add it to `i18n.locales`",
        );

        let err = diag.into_result().unwrap_err();
        assert_eq!(err.errors().len(), 2);
        let display = err.to_string();
        assert!(display.contains("2 errors"));
        assert!(display.contains("build.max_depth"));
        assert!(display.contains("add it to"));
    }

    #[test]
    fn hints_alone_do_not_fail() {
        let mut diag = ConfigDiagnostics::new();
        diag.hint(FieldPath::new("plugins.command"), "`tagger` not found in PATH");
        assert!(diag.is_empty());
        assert_eq!(diag.hints().len(), 1);
        assert!(diag.into_result().is_ok());
    }
}
