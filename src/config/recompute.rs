//! Recompute orchestration configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds on how long a recompute may wait on the store or the scope lock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecomputeSettings {
    /// Timeout applied to every individual store call
    pub store_timeout_ms: u64,
    /// How long a trigger waits for a concurrent rebuild of the same scope
    pub lock_timeout_ms: u64,
}

impl Default for RecomputeSettings {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
            lock_timeout_ms: 30_000,
        }
    }
}

impl RecomputeSettings {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
