//! Build errors.
//!
//! Fatal errors stop a build and propagate with `?`. Everything that goes
//! wrong inside one unit of work becomes a [`UnitFailure`] instead and the
//! rest of the build carries on.

use crate::content::ScanError;
use crate::hooks::HookFailure;
use crate::utils::plural_count;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to reload config")]
    Config(#[source] anyhow::Error),

    #[error("failed to load plugins")]
    Plugins(#[source] anyhow::Error),

    #[error("failed to prepare output directory `{}`", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build finished with {}", plural_count(*.count, "error"))]
    Failed { count: usize },
}

/// Where a per-unit failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Page,
    Hook,
    Asset,
    Emitter,
}

impl FailureKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Hook => "hook",
            Self::Asset => "asset",
            Self::Emitter => "emitter",
        }
    }
}

/// One recorded failure of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub kind: FailureKind,
    /// File the failure belongs to; empty for build-level hooks.
    pub path: PathBuf,
    pub message: String,
}

impl UnitFailure {
    pub fn new(kind: FailureKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<HookFailure> for UnitFailure {
    fn from(failure: HookFailure) -> Self {
        Self {
            kind: FailureKind::Hook,
            path: failure.page.unwrap_or_default(),
            message: format!("{} `{}`: {}", failure.event, failure.handler, failure.message),
        }
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.as_os_str().is_empty() {
            write!(f, "[{}] {}", self.kind.name(), self.message)
        } else {
            write!(
                f,
                "[{}] {}: {}",
                self.kind.name(),
                self.path.display(),
                self.message
            )
        }
    }
}
