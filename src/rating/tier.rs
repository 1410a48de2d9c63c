//! Leaderboard classification of ratings and streaks

use serde::{Deserialize, Serialize};
use std::fmt;

/// Skill band a rating falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RankTier {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Master,
}

impl RankTier {
    pub fn for_rating(rating: i32) -> Self {
        match rating {
            r if r >= 1800 => RankTier::Master,
            r if r >= 1600 => RankTier::Expert,
            r if r >= 1400 => RankTier::Advanced,
            r if r >= 1200 => RankTier::Intermediate,
            _ => RankTier::Beginner,
        }
    }
}

impl fmt::Display for RankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankTier::Beginner => write!(f, "Beginner"),
            RankTier::Intermediate => write!(f, "Intermediate"),
            RankTier::Advanced => write!(f, "Advanced"),
            RankTier::Expert => write!(f, "Expert"),
            RankTier::Master => write!(f, "Master"),
        }
    }
}

/// How hot a competitor's current win streak is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StreakHeat {
    Cold,
    Active,
    Warm,
    Hot,
}

impl StreakHeat {
    pub fn for_streak(current_streak: u32) -> Self {
        match current_streak {
            0 => StreakHeat::Cold,
            1 | 2 => StreakHeat::Active,
            3 | 4 => StreakHeat::Warm,
            _ => StreakHeat::Hot,
        }
    }
}

impl fmt::Display for StreakHeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreakHeat::Cold => write!(f, "Cold"),
            StreakHeat::Active => write!(f, "Active"),
            StreakHeat::Warm => write!(f, "Warm"),
            StreakHeat::Hot => write!(f, "Hot"),
        }
    }
}
