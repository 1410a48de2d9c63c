//! Rating system built on Elo
//!
//! This module provides the pure replay engine, the snapshot audit run before
//! persisting, and leaderboard classification helpers.

pub mod audit;
pub mod engine;
pub mod tier;

// Re-export commonly used types
pub use audit::{verify_snapshot, SnapshotTotals};
pub use engine::{sort_for_replay, AppliedMatch, RatingEngine, RatingReplay};
pub use tier::{RankTier, StreakHeat};
