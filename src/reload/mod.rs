//! Rebuild decisions.
//!
//! ```text
//! paths ─▶ classify ─▶ ChangeSet ─▶ plan ─▶ RebuildPlan
//!                                    ▲
//!                      DependencyGraph + ContentRegistry
//! ```
//!
//! # Modules
//!
//! - `classify` - File categorization against the configured roots
//! - `plan` - Full, selective or asset-only rebuild decision

pub mod classify;
pub mod plan;

pub use classify::{ChangeSet, ClassifyRoots, classify};
pub use plan::{FullReason, RebuildPlan, TemplatePolicy, plan};
