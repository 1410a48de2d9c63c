//! Ladder application layer
//!
//! Validated writes to competitors and matches, and the read models built on
//! top of the committed stats.

pub mod leaderboard;
pub mod service;

pub use leaderboard::{rank, LeaderboardEntry};
pub use service::{LadderService, MatchOutcome};
