//! Persistence port for jobs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Job, JobStatus};

/// The outcome of a single terminal task, as reported to
/// [`JobRepository::record_task_outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    Completed,
    Failed,
}

/// Typed reads/writes for jobs, including the atomic counter update that
/// alone backs the Progress Aggregator (spec §4.3).
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Persists a new job. Called inside the same transaction as the
    /// job's tasks by the Dispatcher.
    async fn insert(&self, job: &Job) -> DomainResult<()>;

    async fn get(&self, id: Uuid) -> DomainResult<Option<Job>>;

    /// Atomically increments `completed_tasks` or `failed_tasks`,
    /// transitions `pending -> running` on the first recorded outcome, and
    /// — if the new sum equals `total_tasks` — sets `completed_at` and the
    /// derived terminal status. Implementations must perform this as a
    /// single read-modify-write statement (never read-then-write), and
    /// must be a no-op with respect to the counters if the job is already
    /// `cancelled`.
    ///
    /// Returns the job as it stands after the update.
    async fn record_task_outcome(&self, id: Uuid, outcome: TerminalOutcome, now: DateTime<Utc>) -> DomainResult<Job>;

    /// Transitions a `pending`/`running` job to `cancelled`. Returns
    /// `Ok(None)` if the job does not exist, and an error if it is already
    /// terminal.
    async fn cancel(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Option<Job>>;

    /// Marks that at least one task has started, transitioning
    /// `pending -> running` if not already past that point. Idempotent.
    async fn mark_running(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<()>;

    /// Current status, used by workers to decide whether to skip a task
    /// because its job was cancelled.
    async fn status(&self, id: Uuid) -> DomainResult<Option<JobStatus>>;
}
