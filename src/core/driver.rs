//! Build mode for production/development builds.

/// Build mode configuration.
///
/// Decides what happens with per-unit failures once a build finishes: they are
/// always collected, but only fail the process in production or strict mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// `vellum build`: failures make the process exit non-zero.
    pub production: bool,

    /// `--strict`: any page failure is fatal, also in watch mode.
    pub strict: bool,
}

impl BuildMode {
    /// Production mode: one-shot build, errors fail the process.
    pub const PRODUCTION: Self = Self {
        production: true,
        strict: false,
    };

    /// Development mode: watch builds, errors are logged and skipped.
    pub const DEVELOPMENT: Self = Self {
        production: false,
        strict: false,
    };

    /// Same mode with `--strict` applied.
    #[inline]
    pub const fn with_strict(self, strict: bool) -> Self {
        Self { strict, ..self }
    }

    /// Whether recorded unit failures turn into a fatal error.
    #[inline]
    pub const fn fails_on_error(&self) -> bool {
        self.production || self.strict
    }

    /// Value exported to plugins as `VELLUM_MODE`.
    pub const fn label(&self) -> &'static str {
        if self.production { "build" } else { "watch" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_tolerates_errors_unless_strict() {
        assert!(!BuildMode::DEVELOPMENT.fails_on_error());
        assert!(BuildMode::DEVELOPMENT.with_strict(true).fails_on_error());
        assert!(BuildMode::PRODUCTION.fails_on_error());
    }
}
