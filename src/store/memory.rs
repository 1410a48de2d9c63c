//! In-memory ladder store
//!
//! Keeps every scope behind a single `RwLock`, which makes the bulk stats
//! write atomic: the new snapshot is fully built before the write lock
//! swaps it in.

use crate::error::{LadderError, Result};
use crate::store::LadderStore;
use crate::types::{
    Competitor, CompetitorId, CompetitorStats, LadderSnapshot, MatchDraft, MatchId, MatchRecord,
    ScopeId, StatsSnapshot,
};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Everything stored for one scope
#[derive(Debug, Default)]
struct ScopeData {
    competitors: BTreeMap<CompetitorId, Competitor>,
    matches: BTreeMap<MatchId, MatchRecord>,
    staged_reset: Option<CompetitorStats>,
}

/// In-memory storage implementation
#[derive(Debug)]
pub struct InMemoryLadderStore {
    scopes: RwLock<HashMap<ScopeId, ScopeData>>,
    next_id: AtomicU64,
}

impl InMemoryLadderStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a store seeded from serialized ladders
    ///
    /// Ids from the snapshots are kept; new ids continue after the highest one.
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = LadderSnapshot>) -> Self {
        let mut scopes = HashMap::new();
        let mut highest = 0;

        for snapshot in snapshots {
            let data: &mut ScopeData = scopes.entry(snapshot.scope).or_default();
            for competitor in snapshot.competitors {
                highest = highest.max(competitor.id);
                data.competitors.insert(competitor.id, competitor);
            }
            for record in snapshot.matches {
                highest = highest.max(record.id);
                data.matches.insert(record.id, record);
            }
        }

        Self {
            scopes: RwLock::new(scopes),
            next_id: AtomicU64::new(highest + 1),
        }
    }

    /// Export the committed content of a scope
    pub fn snapshot(&self, scope: &str) -> Result<LadderSnapshot> {
        let scopes = self.read("snapshot")?;
        let (competitors, mut matches): (Vec<Competitor>, Vec<MatchRecord>) = match scopes.get(scope) {
            Some(data) => (
                data.competitors.values().cloned().collect(),
                data.matches.values().cloned().collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        crate::rating::sort_for_replay(&mut matches);

        Ok(LadderSnapshot {
            scope: scope.to_string(),
            competitors,
            matches,
        })
    }

    /// Whether a reset is waiting to be committed (for testing)
    pub fn has_staged_reset(&self, scope: &str) -> bool {
        self.scopes
            .read()
            .map(|scopes| {
                scopes
                    .get(scope)
                    .is_some_and(|data| data.staged_reset.is_some())
            })
            .unwrap_or(false)
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn read(&self, operation: &str) -> Result<RwLockReadGuard<'_, HashMap<ScopeId, ScopeData>>> {
        self.scopes
            .read()
            .map_err(|_| LadderError::store_failed(operation, "failed to acquire scopes read lock").into())
    }

    fn write(&self, operation: &str) -> Result<RwLockWriteGuard<'_, HashMap<ScopeId, ScopeData>>> {
        self.scopes
            .write()
            .map_err(|_| LadderError::store_failed(operation, "failed to acquire scopes write lock").into())
    }
}

impl Default for InMemoryLadderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LadderStore for InMemoryLadderStore {
    async fn list_competitors(&self, scope: &str) -> Result<Vec<Competitor>> {
        let scopes = self.read("list_competitors")?;
        Ok(scopes
            .get(scope)
            .map(|data| data.competitors.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_competitor(&self, scope: &str, competitor_id: CompetitorId) -> Result<Option<Competitor>> {
        let scopes = self.read("get_competitor")?;
        Ok(scopes
            .get(scope)
            .and_then(|data| data.competitors.get(&competitor_id))
            .cloned())
    }

    async fn create_competitor(
        &self,
        scope: &str,
        name: &str,
        baseline: CompetitorStats,
    ) -> Result<Competitor> {
        let mut scopes = self.write("create_competitor")?;
        let competitor = Competitor {
            id: self.allocate_id(),
            name: name.to_string(),
            stats: baseline,
            created_at: current_timestamp(),
        };

        scopes
            .entry(scope.to_string())
            .or_default()
            .competitors
            .insert(competitor.id, competitor.clone());

        debug!("Stored competitor {} '{}' in scope '{}'", competitor.id, competitor.name, scope);
        Ok(competitor)
    }

    async fn rename_competitor(
        &self,
        scope: &str,
        competitor_id: CompetitorId,
        name: &str,
    ) -> Result<Competitor> {
        let mut scopes = self.write("rename_competitor")?;
        let competitor = scopes
            .get_mut(scope)
            .and_then(|data| data.competitors.get_mut(&competitor_id))
            .ok_or(LadderError::CompetitorNotFound { competitor_id })?;

        competitor.name = name.to_string();
        Ok(competitor.clone())
    }

    async fn list_matches(&self, scope: &str) -> Result<Vec<MatchRecord>> {
        let scopes = self.read("list_matches")?;
        let mut matches: Vec<MatchRecord> = scopes
            .get(scope)
            .map(|data| data.matches.values().cloned().collect())
            .unwrap_or_default();
        crate::rating::sort_for_replay(&mut matches);
        Ok(matches)
    }

    async fn get_match(&self, scope: &str, match_id: MatchId) -> Result<Option<MatchRecord>> {
        let scopes = self.read("get_match")?;
        Ok(scopes
            .get(scope)
            .and_then(|data| data.matches.get(&match_id))
            .cloned())
    }

    async fn create_match(&self, scope: &str, draft: &MatchDraft) -> Result<MatchRecord> {
        let mut scopes = self.write("create_match")?;
        let record = draft.clone().into_record(self.allocate_id(), current_timestamp());

        scopes
            .entry(scope.to_string())
            .or_default()
            .matches
            .insert(record.id, record.clone());

        debug!("Stored match {} in scope '{}'", record.id, scope);
        Ok(record)
    }

    async fn update_match(
        &self,
        scope: &str,
        match_id: MatchId,
        draft: &MatchDraft,
    ) -> Result<MatchRecord> {
        let mut scopes = self.write("update_match")?;
        let existing = scopes
            .get_mut(scope)
            .and_then(|data| data.matches.get_mut(&match_id))
            .ok_or(LadderError::MatchNotFound { match_id })?;

        let updated = draft.clone().into_record(match_id, existing.played_at);
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete_match(&self, scope: &str, match_id: MatchId) -> Result<bool> {
        let mut scopes = self.write("delete_match")?;
        Ok(scopes
            .get_mut(scope)
            .and_then(|data| data.matches.remove(&match_id))
            .is_some())
    }

    async fn reset_competitors(&self, scope: &str, baseline: &CompetitorStats) -> Result<()> {
        let mut scopes = self.write("reset_competitors")?;
        scopes.entry(scope.to_string()).or_default().staged_reset = Some(*baseline);
        Ok(())
    }

    async fn write_competitor_stats(&self, scope: &str, stats: &StatsSnapshot) -> Result<()> {
        let mut scopes = self.write("write_competitor_stats")?;
        let data = scopes.entry(scope.to_string()).or_default();

        if let Some(unknown) = stats.keys().find(|id| !data.competitors.contains_key(*id)) {
            return Err(LadderError::store_failed(
                "write_competitor_stats",
                format!("competitor {} does not exist in scope '{}'", unknown, scope),
            )
            .into());
        }

        // Build the full next state first so nothing is applied on error
        let staged = data.staged_reset;
        let next: Vec<(CompetitorId, CompetitorStats)> = data
            .competitors
            .iter()
            .map(|(id, competitor)| {
                let value = stats
                    .get(id)
                    .copied()
                    .or(staged)
                    .unwrap_or(competitor.stats);
                (*id, value)
            })
            .collect();

        for (id, value) in next {
            if let Some(competitor) = data.competitors.get_mut(&id) {
                competitor.stats = value;
            }
        }
        data.staged_reset = None;

        debug!("Committed stats for {} competitors in scope '{}'", stats.len(), scope);
        Ok(())
    }

    async fn discard_staged(&self, scope: &str) -> Result<()> {
        let mut scopes = self.write("discard_staged")?;
        if let Some(data) = scopes.get_mut(scope) {
            data.staged_reset = None;
        }
        Ok(())
    }
}
