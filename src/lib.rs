//! Ladder Room - Elo ladder for head-to-head matches
//!
//! This crate records competitors and match results per scope and keeps every
//! derived stat (rating, streaks, win counts) consistent with the full match
//! history by replaying it from scratch after each change.

pub mod config;
pub mod error;
pub mod ladder;
pub mod metrics;
pub mod rating;
pub mod recompute;
pub mod store;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types and traits
pub use error::{LadderError, Result, ValidationError};
pub use types::*;

// Re-export key components
pub use ladder::{LadderService, LeaderboardEntry};
pub use rating::RatingEngine;
pub use recompute::{RecomputeOrchestrator, RecomputeReport};
pub use store::{InMemoryLadderStore, LadderStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
