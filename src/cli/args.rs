//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ConfigOverrides;
use crate::core::BuildMode;

/// Vellum documentation site builder
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the working directory
    #[arg(short = 'C', long, global = true, default_value = "vellum.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site once for production
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, then rebuild incrementally on every change
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

/// Shared build arguments for Build and Watch commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Treat any page, hook or asset error as fatal
    #[arg(short, long)]
    pub strict: bool,

    /// Clean output directory completely before building
    #[arg(short, long)]
    pub clean: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Output directory path (relative to the site root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Content directory path (relative to the site root)
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub content: Option<PathBuf>,
}

impl Commands {
    pub const fn build_args(&self) -> &BuildArgs {
        match self {
            Self::Build { build_args } | Self::Watch { build_args } => build_args,
        }
    }

    /// Production for `build`, development for `watch`; `--strict` on top.
    pub const fn mode(&self) -> BuildMode {
        let base = match self {
            Self::Build { .. } => BuildMode::PRODUCTION,
            Self::Watch { .. } => BuildMode::DEVELOPMENT,
        };
        base.with_strict(self.build_args().strict)
    }
}

impl BuildArgs {
    /// Config values overridden from the command line.
    ///
    /// Relative paths stay relative; the config resolves them against the
    /// site root like file values.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            content: self.content.clone(),
            output: self.output.clone(),
            clean: self.clean,
        }
    }
}
