use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid worker_concurrency: {0}. Must be between 1 and 256")]
    InvalidWorkerConcurrency(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Object store root cannot be empty")]
    EmptyObjectStoreRoot,

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error("Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})")]
    InvalidBackoff(u64, u64),

    #[error("Invalid task_budget_seconds: {0}. Must be positive")]
    InvalidTaskBudget(i64),

    #[error("Invalid max_dispatches_per_second: {0}. Must be at least 1")]
    InvalidDispatchRate(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .imagejob/config.yaml (project config)
    /// 3. .imagejob/local.yaml (project local overrides, optional)
    /// 4. Environment variables (IMAGEJOB_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".imagejob/config.yaml"))
            .merge(Yaml::file(".imagejob/local.yaml"))
            .merge(Env::prefixed("IMAGEJOB_").split("__"))
            .extract()
            .context("failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, for tests and `--config` overrides.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("IMAGEJOB_").split("__"))
            .extract()
            .with_context(|| format!("failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.worker_concurrency == 0 || config.worker_concurrency > 256 {
            return Err(ConfigError::InvalidWorkerConcurrency(config.worker_concurrency));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.object_store.root.is_empty() {
            return Err(ConfigError::EmptyObjectStoreRoot);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.max_retries));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(config.retry.initial_backoff_ms, config.retry.max_backoff_ms));
        }

        if config.task_budget_seconds <= 0 {
            return Err(ConfigError::InvalidTaskBudget(config.task_budget_seconds));
        }

        if config.queue.max_dispatches_per_second == 0 {
            return Err(ConfigError::InvalidDispatchRate(config.queue.max_dispatches_per_second));
        }

        Ok(())
    }
}
