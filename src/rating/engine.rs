//! Elo replay engine
//!
//! Turns a baseline and a match history into final competitor statistics.
//! The engine is pure: it reads nothing but its arguments and its config, so
//! the same input always yields the same snapshot.

use crate::config::RatingConfig;
use crate::error::{LadderError, Result};
use crate::types::{CompetitorId, CompetitorStats, MatchId, MatchRecord, StatsSnapshot};
use crate::validation::validate_match;
use serde::{Deserialize, Serialize};
use skillratings::elo::{expected_score, EloRating};
use tracing::debug;

/// Rating movement produced by a single replayed match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMatch {
    pub match_id: MatchId,
    pub winner: CompetitorId,
    pub loser: CompetitorId,
    /// Points moved from the loser to the winner
    pub delta: i32,
    /// Winner rating after this match
    pub winner_rating: i32,
    /// Loser rating after this match
    pub loser_rating: i32,
}

/// Output of a full replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingReplay {
    /// Final stats for every competitor of the baseline
    pub stats: StatsSnapshot,
    /// Matches in the order they were applied
    pub applied: Vec<AppliedMatch>,
}

/// Deterministic Elo recomputation
#[derive(Debug, Clone, Default)]
pub struct RatingEngine {
    config: RatingConfig,
}

impl RatingEngine {
    /// Create a new rating engine
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Stats every competitor holds before the first replayed match
    pub fn baseline(&self) -> CompetitorStats {
        self.config.baseline()
    }

    /// Probability that the winner was expected to beat the loser
    pub fn expected_score(winner_rating: i32, loser_rating: i32) -> f64 {
        let (expected_winner, _) = expected_score(
            &EloRating {
                rating: f64::from(winner_rating),
            },
            &EloRating {
                rating: f64::from(loser_rating),
            },
        );
        expected_winner
    }

    /// Points the winner takes from the loser
    pub fn rating_delta(&self, winner_rating: i32, loser_rating: i32) -> i32 {
        let expected = Self::expected_score(winner_rating, loser_rating);
        (self.config.k_factor * (1.0 - expected)).round() as i32
    }

    /// Apply one match to the running stats
    pub fn apply(&self, stats: &mut StatsSnapshot, record: &MatchRecord) -> Result<AppliedMatch> {
        validate_match(record).map_err(|e| LadderError::RatingCalculationFailed {
            reason: format!("match {} is invalid: {}", record.id, e),
        })?;

        let winner_id = record.winner;
        let loser_id = record.loser();

        let winner_rating = Self::rating_of(stats, winner_id, record.id)?;
        let loser_rating = Self::rating_of(stats, loser_id, record.id)?;
        let delta = self.rating_delta(winner_rating, loser_rating);

        let winner_rating = Self::shift(winner_rating, delta, record.id)?;
        let loser_rating = Self::shift(loser_rating, -delta, record.id)?;

        let winner = Self::entry(stats, winner_id, record.id)?;
        winner.rating = winner_rating;
        winner.matches_played += 1;
        winner.matches_won += 1;
        winner.current_streak += 1;
        winner.max_streak = winner.max_streak.max(winner.current_streak);

        let loser = Self::entry(stats, loser_id, record.id)?;
        loser.rating = loser_rating;
        loser.matches_played += 1;
        loser.current_streak = 0;
        loser.max_streak = loser.max_streak.max(loser.current_streak);

        Ok(AppliedMatch {
            match_id: record.id,
            winner: winner_id,
            loser: loser_id,
            delta,
            winner_rating,
            loser_rating,
        })
    }

    /// Replay the whole history on top of `baseline`
    ///
    /// Matches are applied in (played_at, id) order regardless of the order
    /// they are passed in.
    pub fn recompute(&self, baseline: &StatsSnapshot, matches: &[MatchRecord]) -> Result<RatingReplay> {
        let mut ordered: Vec<&MatchRecord> = matches.iter().collect();
        ordered.sort_by_key(|record| record.replay_key());

        let mut stats = baseline.clone();
        let mut applied = Vec::with_capacity(ordered.len());
        for record in ordered {
            applied.push(self.apply(&mut stats, record)?);
        }

        debug!(
            "Replayed {} matches across {} competitors",
            applied.len(),
            stats.len()
        );

        Ok(RatingReplay { stats, applied })
    }

    fn rating_of(stats: &StatsSnapshot, competitor_id: CompetitorId, match_id: MatchId) -> Result<i32> {
        stats
            .get(&competitor_id)
            .map(|entry| entry.rating)
            .ok_or_else(|| Self::unknown(competitor_id, match_id))
    }

    fn shift(rating: i32, delta: i32, match_id: MatchId) -> Result<i32> {
        rating.checked_add(delta).ok_or_else(|| {
            LadderError::RatingCalculationFailed {
                reason: format!(
                    "match {} moves rating {} by {} out of range",
                    match_id, rating, delta
                ),
            }
            .into()
        })
    }

    fn entry(
        stats: &mut StatsSnapshot,
        competitor_id: CompetitorId,
        match_id: MatchId,
    ) -> Result<&mut CompetitorStats> {
        stats
            .get_mut(&competitor_id)
            .ok_or_else(|| Self::unknown(competitor_id, match_id))
    }

    fn unknown(competitor_id: CompetitorId, match_id: MatchId) -> anyhow::Error {
        LadderError::RatingCalculationFailed {
            reason: format!(
                "match {} references unknown competitor {}",
                match_id, competitor_id
            ),
        }
        .into()
    }
}

/// Sort matches into replay order in place
pub fn sort_for_replay(matches: &mut [MatchRecord]) {
    matches.sort_by_key(|record| record.replay_key());
}
