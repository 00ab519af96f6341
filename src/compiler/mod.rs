//! Render bookkeeping shared across builds.

pub mod dependency;

pub use dependency::DependencyGraph;
