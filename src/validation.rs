//! Input validation for competitors and matches
//!
//! All checks here are pure and run before any store write, so a rejected
//! input never leaves partial state behind.

use crate::error::ValidationError;
use crate::types::{Competitor, CompetitorId, MatchDraft, MatchRecord};
use crate::utils::names_collide;
use std::collections::HashSet;

type Validation<T> = std::result::Result<T, ValidationError>;

/// Trim a display name and reject empty ones
pub fn normalize_name(raw: &str) -> Validation<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

/// Reject a name that collides case-insensitively with another competitor
///
/// `exclude` skips the competitor being renamed so keeping a name (or only
/// changing its case) is allowed.
pub fn ensure_unique_name<'a>(
    name: &str,
    existing: impl IntoIterator<Item = &'a Competitor>,
    exclude: Option<CompetitorId>,
) -> Validation<()> {
    let taken = existing
        .into_iter()
        .filter(|competitor| Some(competitor.id) != exclude)
        .any(|competitor| names_collide(&competitor.name, name));

    if taken {
        return Err(ValidationError::DuplicateName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Participants must differ and the winner must be one of them
pub fn validate_pairing(
    participant_a: CompetitorId,
    participant_b: CompetitorId,
    winner: CompetitorId,
) -> Validation<()> {
    if participant_a == participant_b {
        return Err(ValidationError::SelfMatch {
            competitor_id: participant_a,
        });
    }
    if winner != participant_a && winner != participant_b {
        return Err(ValidationError::WinnerNotParticipant { winner });
    }
    Ok(())
}

/// Scores are optional, but when present they must back up the winner
pub fn validate_scores(
    participant_a: CompetitorId,
    winner: CompetitorId,
    score_a: Option<i32>,
    score_b: Option<i32>,
) -> Validation<()> {
    let (score_a, score_b) = match (score_a, score_b) {
        (None, None) => return Ok(()),
        (Some(a), Some(b)) => (a, b),
        _ => return Err(ValidationError::IncompleteScore),
    };

    for score in [score_a, score_b] {
        if score < 0 {
            return Err(ValidationError::NegativeScore { score });
        }
    }
    if score_a == score_b {
        return Err(ValidationError::TiedScore { score: score_a });
    }

    let a_won = winner == participant_a;
    if a_won != (score_a > score_b) {
        return Err(ValidationError::ScoreMismatch { winner });
    }
    Ok(())
}

/// Structural checks on a stored record
pub fn validate_match(record: &MatchRecord) -> Validation<()> {
    validate_pairing(record.participant_a, record.participant_b, record.winner)?;
    validate_scores(
        record.participant_a,
        record.winner,
        record.score_a,
        record.score_b,
    )
}

/// Full checks on a draft against the competitors registered in the scope
pub fn validate_draft(draft: &MatchDraft, registered: &HashSet<CompetitorId>) -> Validation<()> {
    if registered.len() < 2 {
        return Err(ValidationError::NotEnoughCompetitors {
            registered: registered.len(),
        });
    }

    validate_pairing(draft.participant_a, draft.participant_b, draft.winner)?;

    for competitor_id in [draft.participant_a, draft.participant_b] {
        if !registered.contains(&competitor_id) {
            return Err(ValidationError::UnknownCompetitor { competitor_id });
        }
    }

    validate_scores(draft.participant_a, draft.winner, draft.score_a, draft.score_b)
}
