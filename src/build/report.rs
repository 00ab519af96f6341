//! Outcome of one build.

use super::error::{BuildError, UnitFailure};
use crate::core::BuildMode;
use crate::{debug, log};
use crate::reload::FullReason;
use crate::utils::plural_count;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildKind {
    Full(FullReason),
    Selective,
    AssetCopyOnly,
}

impl BuildKind {
    /// Value of `BuildInfo::kind` for `before-build` hooks.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Full(_) => "full",
            Self::Selective => "selective",
            Self::AssetCopyOnly => "assets",
        }
    }

    #[cfg(test)]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(reason) => write!(f, "full build ({reason})"),
            Self::Selective => f.write_str("selective build"),
            Self::AssetCopyOnly => f.write_str("asset copy"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub kind: BuildKind,
    /// Pages rendered by this build.
    pub pages: usize,
    /// Pages and emitted files whose output changed on disk.
    pub written: usize,
    /// Assets in sync with the output after this build.
    pub assets: usize,
    pub elapsed: Duration,
    pub failures: Vec<UnitFailure>,
}

impl BuildReport {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// One line: `selective build: 2 pages, 0 assets in 14.20ms`.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}, {} in {:.2?}",
            self.kind,
            plural_count(self.pages, "page"),
            plural_count(self.assets, "asset"),
            self.elapsed
        );
        if !self.is_ok() {
            line.push_str(&format!(", {}", plural_count(self.failures.len(), "error")));
        }
        line
    }

    /// Every failure, one per line.
    pub fn failure_details(&self) -> String {
        self.failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Print the summary and the accumulated errors.
    pub fn log(&self) {
        log!("build"; "{}", self.summary());
        debug!("build"; "{} changed on disk", plural_count(self.written, "output"));
        for failure in &self.failures {
            log!("error"; "{}", failure);
        }
    }

    /// Turn recorded failures into an error when `mode` does not tolerate them.
    pub fn ensure_ok(&self, mode: BuildMode) -> Result<(), BuildError> {
        if self.is_ok() || !mode.fails_on_error() {
            return Ok(());
        }
        Err(BuildError::Failed {
            count: self.failures.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::error::FailureKind;

    fn report(failures: usize) -> BuildReport {
        BuildReport {
            kind: BuildKind::Selective,
            pages: 2,
            written: 1,
            assets: 1,
            elapsed: Duration::from_millis(5),
            failures: (0..failures)
                .map(|i| UnitFailure::new(FailureKind::Page, format!("/c/{i}.md"), "boom"))
                .collect(),
        }
    }

    #[test]
    fn summary_mentions_errors_only_when_present() {
        assert_eq!(
            report(0).summary(),
            "selective build: 2 pages, 1 asset in 5.00ms"
        );
        assert!(report(2).summary().ends_with(", 2 errors"));
    }

    #[test]
    fn errors_fail_production_and_strict_only() {
        let failed = report(1);
        assert!(failed.ensure_ok(BuildMode::DEVELOPMENT).is_ok());
        assert!(matches!(
            failed.ensure_ok(BuildMode::PRODUCTION),
            Err(BuildError::Failed { count: 1 })
        ));
        assert!(failed.ensure_ok(BuildMode::DEVELOPMENT.with_strict(true)).is_err());
        assert!(report(0).ensure_ok(BuildMode::PRODUCTION).is_ok());
    }

    #[test]
    fn full_kind_shows_reason() {
        assert_eq!(
            BuildKind::Full(FullReason::ConfigChanged).to_string(),
            "full build (config changed)"
        );
        assert_eq!(BuildKind::AssetCopyOnly.name(), "assets");
    }
}
