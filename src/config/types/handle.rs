//! Live config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement, so a
//! config edit during `vellum watch` swaps in the new config between builds.
//! The handle is owned by the build driver, not a global.

use crate::config::{ConfigOverrides, SiteConfig};
use anyhow::Result;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fs;
use std::sync::Arc;

pub struct ConfigHandle {
    current: ArcSwap<SiteConfig>,
    overrides: ConfigOverrides,
    /// blake3 of the config file content the current config was loaded from.
    hash: Mutex<Option<blake3::Hash>>,
}

impl ConfigHandle {
    pub fn new(config: SiteConfig, overrides: ConfigOverrides) -> Self {
        let hash = fs::read(&config.config_path)
            .ok()
            .map(|bytes| blake3::hash(&bytes));
        Self {
            current: ArcSwap::from_pointee(config),
            overrides,
            hash: Mutex::new(hash),
        }
    }

    #[inline]
    pub fn get(&self) -> Arc<SiteConfig> {
        self.current.load_full()
    }

    /// Reload config from disk if content changed.
    ///
    /// Returns `Ok(true)` if config was updated, `Ok(false)` if unchanged.
    /// On error the previous config stays active.
    pub fn reload(&self) -> Result<bool> {
        let path = self.get().config_path.clone();
        let content = fs::read(&path)?;
        let new_hash = blake3::hash(&content);

        if *self.hash.lock() == Some(new_hash) {
            return Ok(false);
        }

        let config = SiteConfig::load(&path, &self.overrides)?;
        self.current.store(Arc::new(config));
        *self.hash.lock() = Some(new_hash);
        Ok(true)
    }
}
