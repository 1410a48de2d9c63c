//! Consistency checks on a replayed snapshot
//!
//! Run by the orchestrator before a snapshot is persisted. A failure here
//! means the replay itself is broken, never that the input was merely odd.

use crate::error::{LadderError, Result};
use crate::types::StatsSnapshot;

/// Totals gathered while auditing a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotTotals {
    pub memberships: u64,
    pub wins: u64,
}

/// Verify the per-competitor and global invariants of a replay
pub fn verify_snapshot(stats: &StatsSnapshot, match_count: usize) -> Result<SnapshotTotals> {
    let mut totals = SnapshotTotals::default();

    for (competitor_id, entry) in stats {
        if entry.matches_won > entry.matches_played {
            return Err(violation(format!(
                "competitor {} won {} of {} matches",
                competitor_id, entry.matches_won, entry.matches_played
            )));
        }
        if entry.current_streak > entry.max_streak {
            return Err(violation(format!(
                "competitor {} has streak {} above its maximum {}",
                competitor_id, entry.current_streak, entry.max_streak
            )));
        }
        totals.memberships += u64::from(entry.matches_played);
        totals.wins += u64::from(entry.matches_won);
    }

    let match_count = match_count as u64;
    if totals.memberships != 2 * match_count {
        return Err(violation(format!(
            "{} played memberships for {} matches",
            totals.memberships, match_count
        )));
    }
    if totals.wins != match_count {
        return Err(violation(format!(
            "{} wins recorded for {} matches",
            totals.wins, match_count
        )));
    }

    Ok(totals)
}

fn violation(reason: String) -> anyhow::Error {
    LadderError::RatingCalculationFailed {
        reason: format!("snapshot invariant violated: {}", reason),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompetitorStats;

    fn stats(played: u32, won: u32, current: u32, max: u32) -> CompetitorStats {
        CompetitorStats {
            rating: 1200,
            current_streak: current,
            max_streak: max,
            matches_played: played,
            matches_won: won,
        }
    }

    #[test]
    fn test_consistent_snapshot() {
        let snapshot: StatsSnapshot = [(1, stats(2, 2, 2, 2)), (2, stats(1, 0, 0, 0)), (3, stats(1, 0, 0, 0))]
            .into_iter()
            .collect();
        let totals = verify_snapshot(&snapshot, 2).unwrap();
        assert_eq!(totals, SnapshotTotals { memberships: 4, wins: 2 });
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(verify_snapshot(&StatsSnapshot::new(), 0).is_ok());
    }

    #[test]
    fn test_more_wins_than_played() {
        let snapshot: StatsSnapshot = [(1, stats(1, 2, 0, 0))].into_iter().collect();
        assert!(verify_snapshot(&snapshot, 1).is_err());
    }

    #[test]
    fn test_streak_above_max() {
        let snapshot: StatsSnapshot = [(1, stats(1, 1, 1, 0)), (2, stats(1, 0, 0, 0))]
            .into_iter()
            .collect();
        assert!(verify_snapshot(&snapshot, 1).is_err());
    }

    #[test]
    fn test_membership_mismatch() {
        let snapshot: StatsSnapshot = [(1, stats(1, 1, 1, 1))].into_iter().collect();
        let err = verify_snapshot(&snapshot, 1).unwrap_err();
        assert!(err.to_string().contains("memberships"));
    }
}
