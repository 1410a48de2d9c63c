//! Main application configuration
//!
//! This module defines the primary configuration structures for the ladder
//! service, including environment variable and file loading and validation.

use crate::config::rating::RatingConfig;
use crate::config::recompute::RecomputeSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub recompute: RecomputeSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "ladder-room".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still win
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Invalid TOML in config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(k_factor) = env::var("RATING_K_FACTOR") {
            self.rating.k_factor = k_factor
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_K_FACTOR value: {}", k_factor))?;
        }
        if let Ok(initial) = env::var("RATING_INITIAL_RATING") {
            self.rating.initial_rating = initial
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_INITIAL_RATING value: {}", initial))?;
        }

        // Recompute settings
        if let Ok(timeout) = env::var("RECOMPUTE_STORE_TIMEOUT_MS") {
            self.recompute.store_timeout_ms = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid RECOMPUTE_STORE_TIMEOUT_MS value: {}", timeout))?;
        }
        if let Ok(timeout) = env::var("RECOMPUTE_LOCK_TIMEOUT_MS") {
            self.recompute.lock_timeout_ms = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid RECOMPUTE_LOCK_TIMEOUT_MS value: {}", timeout))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()?;

    if config.recompute.store_timeout_ms == 0 {
        return Err(anyhow!("Store timeout must be greater than 0"));
    }
    if config.recompute.lock_timeout_ms == 0 {
        return Err(anyhow!("Lock timeout must be greater than 0"));
    }

    Ok(())
}
