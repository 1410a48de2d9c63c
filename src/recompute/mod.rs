//! Recompute orchestration
//!
//! Serializes full rebuilds per scope and persists each one atomically.

pub mod lock;
pub mod orchestrator;

pub use lock::ScopeLocks;
pub use orchestrator::{RecomputeOrchestrator, RecomputeReport};
