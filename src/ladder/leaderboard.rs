//! Leaderboard read model

use crate::rating::{RankTier, StreakHeat};
use crate::types::Competitor;
use crate::utils::name_key;
use serde::{Deserialize, Serialize};

/// One row of the ranking table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub position: usize,
    pub competitor: Competitor,
    pub tier: RankTier,
    pub heat: StreakHeat,
}

/// Rank competitors by rating, highest first, ties by name
pub fn rank(mut competitors: Vec<Competitor>) -> Vec<LeaderboardEntry> {
    competitors.sort_by(|a, b| {
        b.stats
            .rating
            .cmp(&a.stats.rating)
            .then_with(|| name_key(&a.name).cmp(&name_key(&b.name)))
            .then_with(|| a.id.cmp(&b.id))
    });

    competitors
        .into_iter()
        .enumerate()
        .map(|(index, competitor)| LeaderboardEntry {
            position: index + 1,
            tier: RankTier::for_rating(competitor.stats.rating),
            heat: StreakHeat::for_streak(competitor.stats.current_streak),
            competitor,
        })
        .collect()
}
