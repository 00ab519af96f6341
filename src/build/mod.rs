//! Site building.
//!
//! [`BuildOrchestrator`] turns a [`RebuildPlan`](crate::reload::RebuildPlan)
//! into pages, assets and emitted files, running plugin hooks around each page
//! and around the whole build. Per-unit failures are collected into the
//! [`BuildReport`]; only setup errors abort a build.

pub mod assets;
mod error;
mod orchestrator;
mod page;
mod report;
mod session;

pub use error::BuildError;
pub use orchestrator::BuildOrchestrator;
pub use report::BuildReport;
#[cfg(test)]
pub use report::BuildKind;
