//! `vellum watch`: initial build, then incremental rebuilds.

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::build::BuildOrchestrator;
use crate::config::{ConfigHandle, ConfigOverrides, SiteConfig};
use crate::core::BuildMode;
use crate::watch::SiteWatcher;

/// Watch the site until `shutdown` receives Ctrl+C.
pub async fn watch_site(
    config: SiteConfig,
    overrides: ConfigOverrides,
    mode: BuildMode,
    shutdown: UnboundedReceiver<()>,
) -> Result<()> {
    // attach first so edits during the initial build are seen
    let watcher = SiteWatcher::new(&config).context("failed to start file watcher")?;

    let handle = ConfigHandle::new(config, overrides);
    let mut orchestrator = BuildOrchestrator::new(handle, mode);
    watcher.run(&mut orchestrator, shutdown).await?;
    Ok(())
}
