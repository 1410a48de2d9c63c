//! Ladder application service
//!
//! Owns every write to competitors and matches. Inputs are validated before
//! the store is touched, and every write to match history is followed by a
//! full recompute of the scope.

use crate::config::AppConfig;
use crate::error::{LadderError, Result, ValidationError};
use crate::ladder::leaderboard::{rank, LeaderboardEntry};
use crate::metrics::MetricsCollector;
use crate::rating::RatingEngine;
use crate::recompute::{RecomputeOrchestrator, RecomputeReport};
use crate::store::LadderStore;
use crate::types::{Competitor, CompetitorId, MatchDraft, MatchId, MatchRecord};
use crate::validation::{ensure_unique_name, normalize_name, validate_draft};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// A match write together with the rebuild it caused
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub record: MatchRecord,
    pub report: RecomputeReport,
}

/// Entry point for the surrounding application
pub struct LadderService {
    store: Arc<dyn LadderStore>,
    orchestrator: Arc<RecomputeOrchestrator>,
    metrics_collector: Arc<MetricsCollector>,
}

impl LadderService {
    /// Create a service sharing the orchestrator's metrics
    pub fn new(store: Arc<dyn LadderStore>, orchestrator: Arc<RecomputeOrchestrator>) -> Self {
        let metrics_collector = orchestrator.metrics();
        Self {
            store,
            orchestrator,
            metrics_collector,
        }
    }

    /// Wire engine, orchestrator and service from configuration
    pub fn from_config(store: Arc<dyn LadderStore>, config: &AppConfig) -> Result<Self> {
        let engine = RatingEngine::new(config.rating)?;
        let orchestrator = Arc::new(RecomputeOrchestrator::new(
            store.clone(),
            engine,
            config.recompute.clone(),
        ));
        Ok(Self::new(store, orchestrator))
    }

    pub fn orchestrator(&self) -> Arc<RecomputeOrchestrator> {
        self.orchestrator.clone()
    }

    /// Register a new competitor at the baseline rating
    pub async fn register_competitor(&self, scope: &str, name: &str) -> Result<Competitor> {
        let name = normalize_name(name).map_err(|e| self.reject(e))?;
        let existing = self.store.list_competitors(scope).await?;
        ensure_unique_name(&name, &existing, None).map_err(|e| self.reject(e))?;

        let baseline = self.orchestrator.engine().baseline();
        let competitor = self.store.create_competitor(scope, &name, baseline).await?;
        self.metrics_collector.record_write("competitor_created");

        info!(
            "Registered competitor {} '{}' in scope '{}'",
            competitor.id, competitor.name, scope
        );
        Ok(competitor)
    }

    /// Change a competitor's display name
    ///
    /// Names do not affect ratings, so no recompute follows.
    pub async fn rename_competitor(
        &self,
        scope: &str,
        competitor_id: CompetitorId,
        name: &str,
    ) -> Result<Competitor> {
        let name = normalize_name(name).map_err(|e| self.reject(e))?;
        let existing = self.store.list_competitors(scope).await?;
        if !existing.iter().any(|competitor| competitor.id == competitor_id) {
            return Err(LadderError::CompetitorNotFound { competitor_id }.into());
        }
        ensure_unique_name(&name, &existing, Some(competitor_id)).map_err(|e| self.reject(e))?;

        let competitor = self
            .store
            .rename_competitor(scope, competitor_id, &name)
            .await?;
        self.metrics_collector.record_write("competitor_renamed");

        info!(
            "Renamed competitor {} to '{}' in scope '{}'",
            competitor_id, competitor.name, scope
        );
        Ok(competitor)
    }

    /// Record a match and rebuild the scope's rankings
    pub async fn record_match(&self, scope: &str, draft: MatchDraft) -> Result<MatchOutcome> {
        self.validate(scope, &draft).await?;

        let record = self.store.create_match(scope, &draft).await?;
        self.metrics_collector.record_write("match_recorded");
        info!(
            "Recorded match {} in scope '{}' - winner {} over {}",
            record.id,
            scope,
            record.winner,
            record.loser()
        );

        let report = self
            .orchestrator
            .trigger(scope)
            .await
            .with_context(|| format!("Match {} was recorded but rankings were not refreshed", record.id))?;
        Ok(MatchOutcome { record, report })
    }

    /// Replace an existing match and rebuild the scope's rankings
    pub async fn edit_match(
        &self,
        scope: &str,
        match_id: MatchId,
        draft: MatchDraft,
    ) -> Result<MatchOutcome> {
        if self.store.get_match(scope, match_id).await?.is_none() {
            return Err(LadderError::MatchNotFound { match_id }.into());
        }
        self.validate(scope, &draft).await?;

        let record = self.store.update_match(scope, match_id, &draft).await?;
        self.metrics_collector.record_write("match_edited");
        info!("Edited match {} in scope '{}'", match_id, scope);

        let report = self
            .orchestrator
            .trigger(scope)
            .await
            .with_context(|| format!("Match {} was edited but rankings were not refreshed", match_id))?;
        Ok(MatchOutcome { record, report })
    }

    /// Delete a match and rebuild the scope's rankings
    pub async fn delete_match(&self, scope: &str, match_id: MatchId) -> Result<RecomputeReport> {
        if !self.store.delete_match(scope, match_id).await? {
            return Err(LadderError::MatchNotFound { match_id }.into());
        }
        self.metrics_collector.record_write("match_deleted");
        info!("Deleted match {} from scope '{}'", match_id, scope);

        self.orchestrator
            .trigger(scope)
            .await
            .with_context(|| format!("Match {} was deleted but rankings were not refreshed", match_id))
    }

    /// Rebuild rankings without changing history, e.g. to retry a failure
    pub async fn recompute(&self, scope: &str) -> Result<RecomputeReport> {
        self.orchestrator.trigger(scope).await
    }

    /// Competitors ranked by rating, highest first
    pub async fn leaderboard(&self, scope: &str) -> Result<Vec<LeaderboardEntry>> {
        let competitors = self.store.list_competitors(scope).await?;
        Ok(rank(competitors))
    }

    /// Match history, newest first
    pub async fn match_history(&self, scope: &str) -> Result<Vec<MatchRecord>> {
        let mut matches = self.store.list_matches(scope).await?;
        matches.reverse();
        Ok(matches)
    }

    async fn validate(&self, scope: &str, draft: &MatchDraft) -> Result<()> {
        let registered: HashSet<CompetitorId> = self
            .store
            .list_competitors(scope)
            .await?
            .iter()
            .map(|competitor| competitor.id)
            .collect();

        validate_draft(draft, &registered).map_err(|e| self.reject(e))
    }

    fn reject(&self, err: ValidationError) -> anyhow::Error {
        self.metrics_collector.record_validation_rejection(err.reason());
        warn!("Rejected ladder input: {}", err);
        LadderError::Validation(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::validation_error;
    use crate::store::InMemoryLadderStore;

    const SCOPE: &str = "club";

    fn create_test_service() -> (LadderService, Arc<InMemoryLadderStore>) {
        let store = Arc::new(InMemoryLadderStore::new());
        let service = LadderService::from_config(store.clone(), &AppConfig::default()).unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn test_register_trims_and_rejects_duplicates() {
        let (service, _store) = create_test_service();

        let ana = service.register_competitor(SCOPE, "  Ana ").await.unwrap();
        assert_eq!(ana.name, "Ana");
        assert_eq!(ana.stats.rating, 1200);

        let err = service.register_competitor(SCOPE, "ANA").await.unwrap_err();
        assert_eq!(
            validation_error(&err),
            Some(&ValidationError::DuplicateName {
                name: "ANA".to_string()
            })
        );

        let err = service.register_competitor(SCOPE, "   ").await.unwrap_err();
        assert_eq!(validation_error(&err), Some(&ValidationError::EmptyName));

        // Same name in another scope is fine
        assert!(service.register_competitor("office", "Ana").await.is_ok());
    }

    #[tokio::test]
    async fn test_rename_competitor() {
        let (service, _store) = create_test_service();
        let ana = service.register_competitor(SCOPE, "Ana").await.unwrap();
        service.register_competitor(SCOPE, "Ben").await.unwrap();

        let renamed = service.rename_competitor(SCOPE, ana.id, "ana").await.unwrap();
        assert_eq!(renamed.name, "ana");

        assert!(service.rename_competitor(SCOPE, ana.id, "BEN").await.is_err());

        let err = service.rename_competitor(SCOPE, 999, "Zed").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LadderError>(),
            Some(LadderError::CompetitorNotFound { competitor_id: 999 })
        ));
    }

    #[tokio::test]
    async fn test_record_match_refreshes_rankings() {
        let (service, _store) = create_test_service();
        let ana = service.register_competitor(SCOPE, "Ana").await.unwrap();
        let ben = service.register_competitor(SCOPE, "Ben").await.unwrap();

        let outcome = service
            .record_match(SCOPE, MatchDraft::win(ana.id, ben.id).with_scores(11, 6))
            .await
            .unwrap();
        assert_eq!(outcome.report.matches_replayed, 1);
        assert_eq!(outcome.report.stats[&ana.id].rating, 1216);

        let board = service.leaderboard(SCOPE).await.unwrap();
        assert_eq!(board[0].competitor.id, ana.id);
        assert_eq!(board[0].competitor.stats.rating, 1216);
        assert_eq!(board[1].competitor.stats.rating, 1184);
    }

    #[tokio::test]
    async fn test_invalid_match_is_never_written() {
        let (service, store) = create_test_service();
        let ana = service.register_competitor(SCOPE, "Ana").await.unwrap();

        let err = service
            .record_match(SCOPE, MatchDraft::win(ana.id, 77))
            .await
            .unwrap_err();
        assert_eq!(
            validation_error(&err),
            Some(&ValidationError::NotEnoughCompetitors { registered: 1 })
        );

        let ben = service.register_competitor(SCOPE, "Ben").await.unwrap();
        let err = service
            .record_match(SCOPE, MatchDraft::win(ana.id, ana.id))
            .await
            .unwrap_err();
        assert_eq!(
            validation_error(&err),
            Some(&ValidationError::SelfMatch { competitor_id: ana.id })
        );

        let err = service
            .record_match(SCOPE, MatchDraft::win(ana.id, ben.id).with_scores(3, 11))
            .await
            .unwrap_err();
        assert_eq!(
            validation_error(&err),
            Some(&ValidationError::ScoreMismatch { winner: ana.id })
        );

        assert!(store.list_matches(SCOPE).await.unwrap().is_empty());
        let rejected = service
            .orchestrator()
            .metrics()
            .ladder()
            .validation_rejections_total
            .with_label_values(&["self_match"])
            .get();
        assert_eq!(rejected, 1);
    }

    #[tokio::test]
    async fn test_edit_match_flips_result() {
        let (service, _store) = create_test_service();
        let ana = service.register_competitor(SCOPE, "Ana").await.unwrap();
        let ben = service.register_competitor(SCOPE, "Ben").await.unwrap();

        let recorded = service
            .record_match(SCOPE, MatchDraft::win(ana.id, ben.id))
            .await
            .unwrap();
        let edited = service
            .edit_match(SCOPE, recorded.record.id, MatchDraft::win(ben.id, ana.id))
            .await
            .unwrap();

        assert_eq!(edited.record.played_at, recorded.record.played_at);
        assert_eq!(edited.report.stats[&ben.id].rating, 1216);
        assert_eq!(edited.report.stats[&ana.id].rating, 1184);
        assert_eq!(edited.report.stats[&ana.id].matches_won, 0);

        let err = service
            .edit_match(SCOPE, 4242, MatchDraft::win(ben.id, ana.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LadderError>(),
            Some(LadderError::MatchNotFound { match_id: 4242 })
        ));
    }

    #[tokio::test]
    async fn test_delete_match_restores_baseline() {
        let (service, _store) = create_test_service();
        let ana = service.register_competitor(SCOPE, "Ana").await.unwrap();
        let ben = service.register_competitor(SCOPE, "Ben").await.unwrap();

        let recorded = service
            .record_match(SCOPE, MatchDraft::win(ana.id, ben.id))
            .await
            .unwrap();
        let report = service.delete_match(SCOPE, recorded.record.id).await.unwrap();
        assert_eq!(report.matches_replayed, 0);

        let board = service.leaderboard(SCOPE).await.unwrap();
        assert!(board.iter().all(|entry| entry.competitor.stats.rating == 1200
            && entry.competitor.stats.matches_played == 0));

        assert!(service.delete_match(SCOPE, recorded.record.id).await.is_err());
    }

    #[tokio::test]
    async fn test_match_history_newest_first() {
        let (service, _store) = create_test_service();
        let ana = service.register_competitor(SCOPE, "Ana").await.unwrap();
        let ben = service.register_competitor(SCOPE, "Ben").await.unwrap();
        let now = chrono::Utc::now();

        service
            .record_match(SCOPE, MatchDraft::win(ana.id, ben.id).at(now - chrono::Duration::days(2)))
            .await
            .unwrap();
        let latest = service
            .record_match(SCOPE, MatchDraft::win(ben.id, ana.id).at(now))
            .await
            .unwrap();

        let history = service.match_history(SCOPE).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, latest.record.id);
    }
}
