//! Rating system configuration

use crate::error::{LadderError, Result};
use crate::types::{CompetitorStats, DEFAULT_RATING};
use serde::{Deserialize, Serialize};

/// Largest accepted K-factor
pub const MAX_K_FACTOR: f64 = 1_000.0;

/// Largest accepted starting rating
pub const MAX_INITIAL_RATING: i32 = 10_000;

/// Elo parameters for the rating engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Maximum rating change per match
    pub k_factor: f64,
    /// Rating every competitor is reset to before a replay
    pub initial_rating: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            initial_rating: DEFAULT_RATING,
        }
    }
}

impl RatingConfig {
    pub fn with_k_factor(k_factor: f64) -> Self {
        Self {
            k_factor,
            ..Self::default()
        }
    }

    /// Stats a competitor holds before any match is replayed
    pub fn baseline(&self) -> CompetitorStats {
        CompetitorStats::baseline(self.initial_rating)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 || self.k_factor > MAX_K_FACTOR {
            return Err(LadderError::ConfigurationError {
                message: format!(
                    "K-factor must be in (0, {}], got {}",
                    MAX_K_FACTOR, self.k_factor
                ),
            }
            .into());
        }

        if self.initial_rating <= 0 || self.initial_rating > MAX_INITIAL_RATING {
            return Err(LadderError::ConfigurationError {
                message: format!(
                    "Initial rating must be in 1..={}, got {}",
                    MAX_INITIAL_RATING, self.initial_rating
                ),
            }
            .into());
        }

        Ok(())
    }
}
