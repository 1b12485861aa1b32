//! Configuration domain model.
//!
//! Recognized options per spec §6/§8, loaded hierarchically by
//! `infrastructure::config::ConfigLoader`.

use serde::{Deserialize, Serialize};

/// Deployment mode: which half of §5's shared-pipeline concurrency model is
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    #[default]
    InProcess,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(default)]
    pub mode: DispatchMode,

    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_task_budget_seconds")]
    pub task_budget_seconds: i64,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    /// Shared secret the worker callback endpoint requires in the
    /// `X-Webhook-Secret` header. Empty disables the check (dev only).
    #[serde(default)]
    pub webhook_secret: String,
}

const fn default_worker_concurrency() -> usize {
    5
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_task_budget_seconds() -> i64 {
    600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            worker_concurrency: default_worker_concurrency(),
            max_retries: default_max_retries(),
            task_budget_seconds: default_task_budget_seconds(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            retry: RetryConfig::default(),
            object_store: ObjectStoreConfig::default(),
            provider: ProviderConfig::default(),
            queue: QueueConfig::default(),
            webhook_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    ".imagejob/imagejob.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ObjectStoreConfig {
    #[serde(default = "default_object_store_root")]
    pub root: String,
}

fn default_object_store_root() -> String {
    ".imagejob/objects".to_string()
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            root: default_object_store_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    #[serde(default = "default_generation_adapter")]
    pub generation: String,
    #[serde(default = "default_vision_adapter")]
    pub vision: String,
    #[serde(default = "default_embedding_adapter")]
    pub embedding: String,
}

fn default_generation_adapter() -> String {
    "mock".to_string()
}

fn default_vision_adapter() -> String {
    "mock".to_string()
}

fn default_embedding_adapter() -> String {
    "mock".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            generation: default_generation_adapter(),
            vision: default_vision_adapter(),
            embedding: default_embedding_adapter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    #[serde(default = "default_queue_name")]
    pub name: String,
    #[serde(default = "default_worker_url")]
    pub worker_url: String,
    #[serde(default = "default_max_concurrent_dispatches")]
    pub max_concurrent_dispatches: u32,
    #[serde(default = "default_max_dispatches_per_second")]
    pub max_dispatches_per_second: u32,
}

fn default_queue_name() -> String {
    "image-jobs".to_string()
}

fn default_worker_url() -> String {
    "http://127.0.0.1:8080/admin/worker/process-task".to_string()
}

const fn default_max_concurrent_dispatches() -> u32 {
    10
}

const fn default_max_dispatches_per_second() -> u32 {
    20
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            worker_url: default_worker_url(),
            max_concurrent_dispatches: default_max_concurrent_dispatches(),
            max_dispatches_per_second: default_max_dispatches_per_second(),
        }
    }
}
