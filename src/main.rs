//! Vellum - incremental builds for multilingual documentation sites.

mod build;
mod cli;
mod compiler;
mod config;
mod content;
mod core;
mod freshness;
mod generator;
mod hooks;
mod logger;
mod page;
mod reload;
mod render;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{ConfigError, SiteConfig, find_config_file};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let args = cli.command.build_args();
    logger::set_verbose(args.verbose);
    let mode = cli.command.mode();

    let cwd = std::env::current_dir()?;
    let config_path = find_config_file(&cli.config, &cwd)
        .ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;
    let overrides = args.overrides();
    let config = SiteConfig::load(&config_path, &overrides)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match &cli.command {
        Commands::Build { .. } => {
            core::setup_shutdown_handler(None)?;
            runtime.block_on(cli::build_site(config, overrides, mode))
        }
        Commands::Watch { .. } => {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            core::setup_shutdown_handler(Some(tx))?;
            runtime.block_on(cli::watch_site(config, overrides, mode, rx))
        }
    }
}
