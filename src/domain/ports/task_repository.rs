//! Persistence port for tasks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{FailureKind, Task, TaskStatus};

/// The result of attempting to claim a task for execution (spec §4.2 step
/// 1). `Claimed` covers both a fresh `pending` claim and a stolen expired
/// lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    Claimed,
    /// Another worker holds a fresh, unexpired claim.
    HeldByAnother,
    /// The task is already terminal; callers should treat this as a no-op
    /// matching the stored outcome rather than re-running the pipeline.
    AlreadyTerminal(TaskStatus),
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert_batch(&self, tasks: &[Task]) -> DomainResult<()>;

    async fn get(&self, id: Uuid) -> DomainResult<Option<Task>>;

    async fn list_by_job(&self, job_id: Uuid) -> DomainResult<Vec<Task>>;

    /// Atomically attempts `pending -> running` (or steals an expired
    /// lease), stamping `started_at`. Single statement — never a separate
    /// read followed by a write.
    async fn claim(&self, id: Uuid, lease_seconds: i64, now: DateTime<Utc>) -> DomainResult<ClaimResult>;

    /// Resets a task to `pending` after a retryable failure, incrementing
    /// `retry_count`.
    async fn reset_for_retry(&self, id: Uuid) -> DomainResult<()>;

    /// Transitions a task to `completed`, storing the produced image id.
    async fn complete(&self, id: Uuid, image_id: Uuid, now: DateTime<Utc>) -> DomainResult<()>;

    /// Transitions a task to `failed` with a classified, human-readable
    /// error.
    async fn fail(&self, id: Uuid, kind: FailureKind, message: &str, now: DateTime<Utc>) -> DomainResult<()>;

    /// Pending tasks whose job is not terminal, for an operator-triggered
    /// re-enqueue sweep (the "reconciler" mentioned in spec §4.1).
    async fn list_stale_pending(&self, older_than_seconds: i64, now: DateTime<Utc>) -> DomainResult<Vec<Task>>;
}
