//! Full-rebuild orchestration
//!
//! Every edit to match history invalidates every derived stat downstream of
//! it, so the orchestrator never patches incrementally. It resets, replays
//! the whole ordered history and commits the result as one snapshot while
//! holding the scope's lock.

use crate::config::RecomputeSettings;
use crate::error::{LadderError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::{verify_snapshot, AppliedMatch, RatingEngine};
use crate::recompute::lock::ScopeLocks;
use crate::store::LadderStore;
use crate::types::{ScopeId, StatsSnapshot};
use crate::utils::generate_run_id;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Summary of a committed rebuild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecomputeReport {
    pub run_id: Uuid,
    pub scope: ScopeId,
    pub matches_replayed: usize,
    pub competitors_updated: usize,
    pub duration: Duration,
    /// Committed stats
    pub stats: StatsSnapshot,
    /// Per-match rating changes in replay order
    pub applied: Vec<AppliedMatch>,
}

/// Step of a rebuild, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Lock,
    Reset,
    Load,
    Replay,
    Audit,
    Write,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::Lock => "lock",
            Stage::Reset => "reset",
            Stage::Load => "load",
            Stage::Replay => "replay",
            Stage::Audit => "audit",
            Stage::Write => "write",
        }
    }
}

/// Coordinates reset, replay and write for a scope
pub struct RecomputeOrchestrator {
    store: Arc<dyn LadderStore>,
    engine: RatingEngine,
    settings: RecomputeSettings,
    locks: ScopeLocks,
    metrics_collector: Arc<MetricsCollector>,
}

impl RecomputeOrchestrator {
    /// Create a new orchestrator with its own metrics collector
    pub fn new(store: Arc<dyn LadderStore>, engine: RatingEngine, settings: RecomputeSettings) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::default());
        Self::with_metrics(store, engine, settings, metrics_collector)
    }

    /// Create a new orchestrator with metrics collector
    pub fn with_metrics(
        store: Arc<dyn LadderStore>,
        engine: RatingEngine,
        settings: RecomputeSettings,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            engine,
            settings,
            locks: ScopeLocks::new(),
            metrics_collector,
        }
    }

    pub fn engine(&self) -> &RatingEngine {
        &self.engine
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Rebuild every derived stat of `scope` from its full match history
    ///
    /// Concurrent triggers on the same scope run one after another. On error
    /// the previously committed stats stay authoritative and the returned
    /// error is retryable.
    pub async fn trigger(&self, scope: &str) -> Result<RecomputeReport> {
        let run_id = generate_run_id();

        debug!("Recompute {} waiting for scope '{}'", run_id, scope);
        let _guard = match tokio::time::timeout(self.settings.lock_timeout(), self.locks.acquire(scope)).await {
            Ok(guard) => guard.map_err(|e| Self::failed(scope, Stage::Lock, e))?,
            Err(_) => {
                warn!(
                    "Recompute {} gave up waiting {}ms for scope '{}'",
                    run_id, self.settings.lock_timeout_ms, scope
                );
                self.metrics_collector.record_recompute_failure(Duration::ZERO);
                return Err(LadderError::RecomputeFailed {
                    scope: scope.to_string(),
                    stage: Stage::Lock.as_str().to_string(),
                }
                .into());
            }
        };

        let start_time = Instant::now();
        info!("Recompute {} started for scope '{}'", run_id, scope);

        match self.rebuild(scope, run_id, start_time).await {
            Ok(report) => {
                self.metrics_collector.record_recompute_success(
                    report.matches_replayed,
                    report.competitors_updated,
                    report.duration,
                );
                info!(
                    "Recompute {} committed for scope '{}' - {} matches, {} competitors in {:?}",
                    run_id, scope, report.matches_replayed, report.competitors_updated, report.duration
                );
                Ok(report)
            }
            Err((stage, err)) => {
                // A timed out reset may still have landed, so always discard
                self.discard_staged(scope, run_id).await;
                self.metrics_collector
                    .record_recompute_failure(start_time.elapsed());
                error!(
                    "Recompute {} failed for scope '{}' during {}: {:#}",
                    run_id,
                    scope,
                    stage.as_str(),
                    err
                );
                Err(Self::failed(scope, stage, err))
            }
        }
    }

    async fn rebuild(
        &self,
        scope: &str,
        run_id: Uuid,
        start_time: Instant,
    ) -> std::result::Result<RecomputeReport, (Stage, anyhow::Error)> {
        let baseline = self.engine.baseline();

        self.call("reset_competitors", self.store.reset_competitors(scope, &baseline))
            .await
            .map_err(|e| (Stage::Reset, e))?;

        let competitors = self
            .call("list_competitors", self.store.list_competitors(scope))
            .await
            .map_err(|e| (Stage::Load, e))?;
        let matches = self
            .call("list_matches", self.store.list_matches(scope))
            .await
            .map_err(|e| (Stage::Load, e))?;

        debug!(
            "Recompute {} loaded {} competitors and {} matches",
            run_id,
            competitors.len(),
            matches.len()
        );

        let reset_snapshot: StatsSnapshot = competitors
            .iter()
            .map(|competitor| (competitor.id, baseline))
            .collect();

        let replay = self
            .engine
            .recompute(&reset_snapshot, &matches)
            .map_err(|e| (Stage::Replay, e))?;

        verify_snapshot(&replay.stats, matches.len()).map_err(|e| (Stage::Audit, e))?;

        self.call(
            "write_competitor_stats",
            self.store.write_competitor_stats(scope, &replay.stats),
        )
        .await
        .map_err(|e| (Stage::Write, e))?;

        Ok(RecomputeReport {
            run_id,
            scope: scope.to_string(),
            matches_replayed: matches.len(),
            competitors_updated: replay.stats.len(),
            duration: start_time.elapsed(),
            stats: replay.stats,
            applied: replay.applied,
        })
    }

    /// Run a store call under the configured timeout
    async fn call<T>(&self, operation: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.settings.store_timeout(), fut).await;
        self.metrics_collector
            .record_store_operation(operation, started.elapsed());

        match result {
            Ok(inner) => inner,
            Err(_) => Err(LadderError::StoreTimeout {
                operation: operation.to_string(),
                timeout_ms: self.settings.store_timeout_ms,
            }
            .into()),
        }
    }

    async fn discard_staged(&self, scope: &str, run_id: Uuid) {
        if let Err(e) = self
            .call("discard_staged", self.store.discard_staged(scope))
            .await
        {
            // The next successful reset replaces whatever is still staged
            warn!(
                "Recompute {} could not discard staged reset for scope '{}': {}",
                run_id, scope, e
            );
        }
    }

    fn failed(scope: &str, stage: Stage, err: anyhow::Error) -> anyhow::Error {
        err.context(LadderError::RecomputeFailed {
            scope: scope.to_string(),
            stage: stage.as_str().to_string(),
        })
    }
}
