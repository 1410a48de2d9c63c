//! Ladder storage interface and implementations
//!
//! This module defines the contract the recompute core needs from whatever
//! persists competitors and matches, plus an in-memory implementation.

pub mod memory;

pub use memory::InMemoryLadderStore;

use crate::error::Result;
use crate::types::{
    Competitor, CompetitorId, CompetitorStats, MatchDraft, MatchId, MatchRecord, StatsSnapshot,
};
use async_trait::async_trait;

/// Trait for ladder storage operations
///
/// Derived stats follow a two-step protocol: `reset_competitors` stages a
/// baseline reset that readers cannot observe, and `write_competitor_stats`
/// commits the staged reset together with the new stats in one atomic step.
/// `discard_staged` drops a staged reset after a failed rebuild.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LadderStore: Send + Sync {
    /// All competitors of the scope, ordered by id
    async fn list_competitors(&self, scope: &str) -> Result<Vec<Competitor>>;

    async fn get_competitor(&self, scope: &str, competitor_id: CompetitorId) -> Result<Option<Competitor>>;

    /// Register a competitor with the given baseline stats
    async fn create_competitor(
        &self,
        scope: &str,
        name: &str,
        baseline: CompetitorStats,
    ) -> Result<Competitor>;

    /// Change a competitor's display name
    async fn rename_competitor(
        &self,
        scope: &str,
        competitor_id: CompetitorId,
        name: &str,
    ) -> Result<Competitor>;

    /// Full match history ordered by (played_at, id) ascending
    async fn list_matches(&self, scope: &str) -> Result<Vec<MatchRecord>>;

    async fn get_match(&self, scope: &str, match_id: MatchId) -> Result<Option<MatchRecord>>;

    async fn create_match(&self, scope: &str, draft: &MatchDraft) -> Result<MatchRecord>;

    /// Replace a match; a draft without a timestamp keeps the stored one
    async fn update_match(
        &self,
        scope: &str,
        match_id: MatchId,
        draft: &MatchDraft,
    ) -> Result<MatchRecord>;

    /// Returns whether a match was removed
    async fn delete_match(&self, scope: &str, match_id: MatchId) -> Result<bool>;

    /// Stage a reset of every competitor's derived stats to `baseline`
    async fn reset_competitors(&self, scope: &str, baseline: &CompetitorStats) -> Result<()>;

    /// Atomically commit the staged reset plus `stats`
    async fn write_competitor_stats(&self, scope: &str, stats: &StatsSnapshot) -> Result<()>;

    /// Drop any staged reset for the scope
    async fn discard_staged(&self, scope: &str) -> Result<()>;
}
