//! Plugin hooks around the build lifecycle.
//!
//! - `event`: lifecycle events and typed payloads
//! - `pipeline`: ordered execution with per-handler failure isolation
//! - `loader`: plugin discovery from config
//! - `runner`: external command handlers

mod event;
mod loader;
mod pipeline;
mod runner;

pub use event::{BuildInfo, BuildSummary, HookEvent, HookPayload, VirtualPage};
pub use loader::{ConfigPluginLoader, PluginLoader};
pub use pipeline::{HookContext, HookFailure, HookPipeline};
#[cfg(test)]
pub use pipeline::{HookHandler, Registration};
