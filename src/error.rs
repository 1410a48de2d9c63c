//! Error types for the ladder service
//!
//! Domain errors are `thiserror` enums carried inside `anyhow::Result` so that
//! store, engine and orchestrator failures can be layered with context and
//! still be inspected by callers.

use crate::types::{CompetitorId, MatchId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Input rejected before any write is attempted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Competitor name cannot be empty")]
    EmptyName,

    #[error("Competitor name already taken: {name}")]
    DuplicateName { name: String },

    #[error("Competitor {competitor_id} cannot play against themselves")]
    SelfMatch { competitor_id: CompetitorId },

    #[error("Winner {winner} is not a participant of the match")]
    WinnerNotParticipant { winner: CompetitorId },

    #[error("Unknown competitor: {competitor_id}")]
    UnknownCompetitor { competitor_id: CompetitorId },

    #[error("Score cannot be negative: {score}")]
    NegativeScore { score: i32 },

    #[error("Scores cannot be tied: {score}-{score}")]
    TiedScore { score: i32 },

    #[error("Both scores must be recorded together")]
    IncompleteScore,

    #[error("Winner {winner} does not hold the higher score")]
    ScoreMismatch { winner: CompetitorId },

    #[error("At least two competitors are required to record a match (found {registered})")]
    NotEnoughCompetitors { registered: usize },
}

impl ValidationError {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::EmptyName => "empty_name",
            ValidationError::DuplicateName { .. } => "duplicate_name",
            ValidationError::SelfMatch { .. } => "self_match",
            ValidationError::WinnerNotParticipant { .. } => "winner_not_participant",
            ValidationError::UnknownCompetitor { .. } => "unknown_competitor",
            ValidationError::NegativeScore { .. } => "negative_score",
            ValidationError::TiedScore { .. } => "tied_score",
            ValidationError::IncompleteScore => "incomplete_score",
            ValidationError::ScoreMismatch { .. } => "score_mismatch",
            ValidationError::NotEnoughCompetitors { .. } => "not_enough_competitors",
        }
    }
}

/// Custom error types for specific ladder scenarios
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Competitor not found: {competitor_id}")]
    CompetitorNotFound { competitor_id: CompetitorId },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: MatchId },

    #[error("Store operation '{operation}' failed: {message}")]
    StoreFailed { operation: String, message: String },

    #[error("Store operation '{operation}' timed out after {timeout_ms}ms")]
    StoreTimeout { operation: String, timeout_ms: u64 },

    #[error("Ranking inconsistent for scope '{scope}' after failure during {stage}, retry recompute")]
    RecomputeFailed { scope: String, stage: String },

    #[error("Rating calculation failed: {reason}")]
    RatingCalculationFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl LadderError {
    /// Whether retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LadderError::StoreFailed { .. }
                | LadderError::StoreTimeout { .. }
                | LadderError::RecomputeFailed { .. }
        )
    }

    pub fn store_failed(operation: &str, message: impl Into<String>) -> Self {
        LadderError::StoreFailed {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// Every `LadderError` found in an error chain, outermost first
///
/// Context layers are only reachable through `anyhow::Error::downcast_ref`,
/// so the top level is checked that way before walking the sources.
pub fn ladder_errors(err: &anyhow::Error) -> impl Iterator<Item = &LadderError> + '_ {
    err.downcast_ref::<LadderError>()
        .into_iter()
        .chain(err.chain().filter_map(|cause| cause.downcast_ref::<LadderError>()))
}

/// Whether any ladder error in the chain is retryable
pub fn is_retryable(err: &anyhow::Error) -> bool {
    ladder_errors(err).any(LadderError::is_retryable)
}

/// Find the validation error in a chain, if the failure was a rejected input
pub fn validation_error(err: &anyhow::Error) -> Option<&ValidationError> {
    ladder_errors(err).find_map(|ladder| match ladder {
        LadderError::Validation(validation) => Some(validation),
        _ => None,
    })
}
