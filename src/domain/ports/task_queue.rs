//! External task queue port (spec §5's "external queue" scheduling mode).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Dispatches a task for out-of-process execution via the Worker
    /// Endpoint. `retry_count` is carried so the receiving worker can
    /// reconstruct the task's position without a second lookup.
    async fn enqueue(&self, task_id: Uuid, retry_count: u32) -> DomainResult<()>;
}
