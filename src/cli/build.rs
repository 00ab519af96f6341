//! `vellum build`: one full production build.

use anyhow::Result;

use crate::build::BuildOrchestrator;
use crate::config::{ConfigHandle, ConfigOverrides, SiteConfig};
use crate::core::BuildMode;

/// Build the whole site, print the summary and fail when errors were
/// recorded and `mode` does not tolerate them.
pub async fn build_site(
    config: SiteConfig,
    overrides: ConfigOverrides,
    mode: BuildMode,
) -> Result<()> {
    let handle = ConfigHandle::new(config, overrides);
    let mut orchestrator = BuildOrchestrator::new(handle, mode);

    let report = orchestrator.full().await?;
    report.log();
    report.ensure_ok(mode)?;
    Ok(())
}
