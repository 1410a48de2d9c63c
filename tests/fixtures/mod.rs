//! Test fixtures and store doubles for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ladder_room::config::AppConfig;
use ladder_room::error::{LadderError, Result};
use ladder_room::ladder::LadderService;
use ladder_room::store::{InMemoryLadderStore, LadderStore};
use ladder_room::types::{
    Competitor, CompetitorId, CompetitorStats, MatchDraft, MatchId, MatchRecord, StatsSnapshot,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory store that can be told to fail or stall on chosen operations
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryLadderStore,
    failing: Mutex<HashSet<&'static str>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    calls: Mutex<Vec<&'static str>>,
    rebuilds: Mutex<RebuildSpans>,
}

/// Rebuilds between a staged reset and its commit or discard
#[derive(Debug, Default)]
struct RebuildSpans {
    open: usize,
    peak: usize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `operation` fail until `heal` is called
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(operation);
        }
    }

    /// Make every call to `operation` sleep before running
    pub fn delay_on(&self, operation: &'static str, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.insert(operation, delay);
        }
    }

    /// Clear all injected failures and delays
    pub fn heal(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
        if let Ok(mut delays) = self.delays.lock() {
            delays.clear();
        }
    }

    /// How many times `operation` was entered
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|call| **call == operation).count())
            .unwrap_or(0)
    }

    /// Most rebuilds that were ever between reset and commit at once
    pub fn peak_overlapping_rebuilds(&self) -> usize {
        self.rebuilds.lock().map(|spans| spans.peak).unwrap_or(0)
    }

    fn open_rebuild(&self) {
        if let Ok(mut spans) = self.rebuilds.lock() {
            spans.open += 1;
            spans.peak = spans.peak.max(spans.open);
        }
    }

    fn close_rebuild(&self) {
        if let Ok(mut spans) = self.rebuilds.lock() {
            spans.open = spans.open.saturating_sub(1);
        }
    }

    pub fn inner(&self) -> &InMemoryLadderStore {
        &self.inner
    }

    async fn enter(&self, operation: &'static str) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(operation);
        }

        let delay = self
            .delays
            .lock()
            .ok()
            .and_then(|delays| delays.get(operation).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing
            .lock()
            .map(|failing| failing.contains(operation))
            .unwrap_or(false);
        if failing {
            return Err(LadderError::store_failed(operation, "injected failure").into());
        }
        Ok(())
    }
}

#[async_trait]
impl LadderStore for FlakyStore {
    async fn list_competitors(&self, scope: &str) -> Result<Vec<Competitor>> {
        self.enter("list_competitors").await?;
        self.inner.list_competitors(scope).await
    }

    async fn get_competitor(
        &self,
        scope: &str,
        competitor_id: CompetitorId,
    ) -> Result<Option<Competitor>> {
        self.enter("get_competitor").await?;
        self.inner.get_competitor(scope, competitor_id).await
    }

    async fn create_competitor(
        &self,
        scope: &str,
        name: &str,
        baseline: CompetitorStats,
    ) -> Result<Competitor> {
        self.enter("create_competitor").await?;
        self.inner.create_competitor(scope, name, baseline).await
    }

    async fn rename_competitor(
        &self,
        scope: &str,
        competitor_id: CompetitorId,
        name: &str,
    ) -> Result<Competitor> {
        self.enter("rename_competitor").await?;
        self.inner.rename_competitor(scope, competitor_id, name).await
    }

    async fn list_matches(&self, scope: &str) -> Result<Vec<MatchRecord>> {
        self.enter("list_matches").await?;
        self.inner.list_matches(scope).await
    }

    async fn get_match(&self, scope: &str, match_id: MatchId) -> Result<Option<MatchRecord>> {
        self.enter("get_match").await?;
        self.inner.get_match(scope, match_id).await
    }

    async fn create_match(&self, scope: &str, draft: &MatchDraft) -> Result<MatchRecord> {
        self.enter("create_match").await?;
        self.inner.create_match(scope, draft).await
    }

    async fn update_match(
        &self,
        scope: &str,
        match_id: MatchId,
        draft: &MatchDraft,
    ) -> Result<MatchRecord> {
        self.enter("update_match").await?;
        self.inner.update_match(scope, match_id, draft).await
    }

    async fn delete_match(&self, scope: &str, match_id: MatchId) -> Result<bool> {
        self.enter("delete_match").await?;
        self.inner.delete_match(scope, match_id).await
    }

    async fn reset_competitors(&self, scope: &str, baseline: &CompetitorStats) -> Result<()> {
        self.enter("reset_competitors").await?;
        self.open_rebuild();
        self.inner.reset_competitors(scope, baseline).await
    }

    async fn write_competitor_stats(&self, scope: &str, stats: &StatsSnapshot) -> Result<()> {
        self.enter("write_competitor_stats").await?;
        let result = self.inner.write_competitor_stats(scope, stats).await;
        if result.is_ok() {
            self.close_rebuild();
        }
        result
    }

    async fn discard_staged(&self, scope: &str) -> Result<()> {
        self.close_rebuild();
        self.enter("discard_staged").await?;
        self.inner.discard_staged(scope).await
    }
}

/// Configuration with short timeouts so failure tests finish quickly
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.recompute.store_timeout_ms = 200;
    config.recompute.lock_timeout_ms = 5_000;
    config
}

/// Service over a fresh in-memory store
pub fn create_test_service() -> (LadderService, Arc<InMemoryLadderStore>) {
    let store = Arc::new(InMemoryLadderStore::new());
    let service = LadderService::from_config(store.clone(), &fast_config()).unwrap();
    (service, store)
}

/// Service over a store with injectable faults
pub fn create_flaky_service() -> (LadderService, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::new());
    let service = LadderService::from_config(store.clone(), &fast_config()).unwrap();
    (service, store)
}

/// Register competitors in order, returning their ids
pub async fn register_all(service: &LadderService, scope: &str, names: &[&str]) -> Vec<CompetitorId> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let competitor = service.register_competitor(scope, name).await.unwrap();
        ids.push(competitor.id);
    }
    ids
}

/// Fixed timestamp on a January 2024 day
pub fn day(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

/// Committed stats of a scope keyed by competitor id
pub async fn committed_stats(store: &dyn LadderStore, scope: &str) -> StatsSnapshot {
    store
        .list_competitors(scope)
        .await
        .unwrap()
        .into_iter()
        .map(|competitor| (competitor.id, competitor.stats))
        .collect()
}
