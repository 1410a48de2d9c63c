//! Per-scope exclusive locks for rebuilds
//!
//! One async mutex per scope, created on first use and handed out as an
//! owned guard so it can be held across the whole reset, replay and write.

use crate::error::{LadderError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of scope locks
#[derive(Debug, Default)]
pub struct ScopeLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `scope`, created if missing
    fn lock_for(&self, scope: &str) -> Result<Arc<AsyncMutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| LadderError::InternalError {
            message: "Failed to acquire scope lock registry".to_string(),
        })?;

        Ok(locks
            .entry(scope.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    /// Wait until the scope is free and hold it until the guard drops
    pub async fn acquire(&self, scope: &str) -> Result<OwnedMutexGuard<()>> {
        let lock = self.lock_for(scope)?;
        Ok(lock.lock_owned().await)
    }

    /// Take the scope only if nobody holds it
    pub fn try_acquire(&self, scope: &str) -> Result<Option<OwnedMutexGuard<()>>> {
        let lock = self.lock_for(scope)?;
        Ok(lock.try_lock_owned().ok())
    }

    /// Number of scopes that have been locked at least once
    pub fn scope_count(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}
