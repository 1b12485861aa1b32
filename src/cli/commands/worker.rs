//! `worker` command handler: runs the in-process bounded worker pool
//! standalone, with no HTTP surface. Re-dispatches any pending tasks found
//! at startup (e.g. left over from a previous process), then waits for a
//! shutdown signal.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::domain::ports::task_repository::TaskRepository;
use crate::services::dispatcher::default_shutdown_grace;
use crate::services::Dispatcher;

pub async fn handle(dispatcher: Arc<Dispatcher>, task_repo: Arc<dyn TaskRepository>) -> Result<()> {
    let stale = task_repo.list_stale_pending(0, chrono::Utc::now()).await?;
    info!(count = stale.len(), "re-dispatching pending tasks found at startup");
    for task in stale {
        if let Err(e) = dispatcher.redispatch(task.id, task.retry_count).await {
            warn!(task_id = %task.id, error = %e, "failed to re-dispatch task at startup");
        }
    }

    info!("worker pool running, waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining in-flight pipeline runs");
    dispatcher.shutdown(default_shutdown_grace()).await;
    Ok(())
}
