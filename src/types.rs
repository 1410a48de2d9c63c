//! Common types used throughout the ladder service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for competitors, assigned by the store
pub type CompetitorId = u64;

/// Unique identifier for matches, assigned by the store
pub type MatchId = u64;

/// Identifier of an independent ladder (dataset scope)
pub type ScopeId = String;

/// Rating every competitor starts from
pub const DEFAULT_RATING: i32 = 1200;

/// Derived statistics for a competitor
///
/// Only the rating engine produces these values; everything else treats them
/// as read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompetitorStats {
    pub rating: i32,
    pub current_streak: u32,
    pub max_streak: u32,
    pub matches_played: u32,
    pub matches_won: u32,
}

impl CompetitorStats {
    /// Fresh stats for a competitor who has not played yet
    pub fn baseline(rating: i32) -> Self {
        Self {
            rating,
            current_streak: 0,
            max_streak: 0,
            matches_played: 0,
            matches_won: 0,
        }
    }

    pub fn matches_lost(&self) -> u32 {
        self.matches_played.saturating_sub(self.matches_won)
    }

    /// Share of matches won, `None` before the first match
    pub fn win_rate(&self) -> Option<f64> {
        if self.matches_played == 0 {
            None
        } else {
            Some(self.matches_won as f64 / self.matches_played as f64)
        }
    }
}

impl Default for CompetitorStats {
    fn default() -> Self {
        Self::baseline(DEFAULT_RATING)
    }
}

/// Derived stats for every competitor of a scope, ordered by id
pub type StatsSnapshot = BTreeMap<CompetitorId, CompetitorStats>;

/// A registered competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
    /// Derived; serialized ladders may omit it. The default is only a
    /// placeholder until the next rebuild resets it to the configured
    /// initial rating.
    #[serde(default)]
    pub stats: CompetitorStats,
    pub created_at: DateTime<Utc>,
}

/// A recorded head-to-head result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub participant_a: CompetitorId,
    pub participant_b: CompetitorId,
    pub winner: CompetitorId,
    #[serde(default)]
    pub score_a: Option<i32>,
    #[serde(default)]
    pub score_b: Option<i32>,
    pub played_at: DateTime<Utc>,
}

impl MatchRecord {
    /// The participant that did not win
    pub fn loser(&self) -> CompetitorId {
        if self.winner == self.participant_a {
            self.participant_b
        } else {
            self.participant_a
        }
    }

    pub fn involves(&self, competitor_id: CompetitorId) -> bool {
        self.participant_a == competitor_id || self.participant_b == competitor_id
    }

    /// Replay order: timestamp first, id breaks ties
    pub fn replay_key(&self) -> (DateTime<Utc>, MatchId) {
        (self.played_at, self.id)
    }
}

/// Input for creating or editing a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDraft {
    pub participant_a: CompetitorId,
    pub participant_b: CompetitorId,
    pub winner: CompetitorId,
    #[serde(default)]
    pub score_a: Option<i32>,
    #[serde(default)]
    pub score_b: Option<i32>,
    /// `None` means "now" on create and "unchanged" on edit
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
}

impl MatchDraft {
    /// Draft for a plain win/loss without scores
    pub fn win(winner: CompetitorId, loser: CompetitorId) -> Self {
        Self {
            participant_a: winner,
            participant_b: loser,
            winner,
            score_a: None,
            score_b: None,
            played_at: None,
        }
    }

    pub fn with_scores(mut self, score_a: i32, score_b: i32) -> Self {
        self.score_a = Some(score_a);
        self.score_b = Some(score_b);
        self
    }

    pub fn at(mut self, played_at: DateTime<Utc>) -> Self {
        self.played_at = Some(played_at);
        self
    }

    /// Materialize the draft into a record
    pub fn into_record(self, id: MatchId, played_at: DateTime<Utc>) -> MatchRecord {
        MatchRecord {
            id,
            participant_a: self.participant_a,
            participant_b: self.participant_b,
            winner: self.winner,
            score_a: self.score_a,
            score_b: self.score_b,
            played_at: self.played_at.unwrap_or(played_at),
        }
    }
}

/// Serializable content of a scope, used to seed stores and by the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LadderSnapshot {
    pub scope: ScopeId,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub matches: Vec<MatchRecord>,
}
