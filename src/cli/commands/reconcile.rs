//! `reconcile` command handler: re-dispatches stale pending tasks (spec
//! §4.1's operator-triggered sweep, covering enqueue failures and
//! in-process restarts).

use anyhow::{Context, Result};
use serde_json::json;

use crate::domain::ports::task_repository::TaskRepository;
use crate::services::Dispatcher;

pub async fn handle(dispatcher: &Dispatcher, task_repo: &dyn TaskRepository, older_than_seconds: i64, json_output: bool) -> Result<()> {
    let stale = task_repo.list_stale_pending(older_than_seconds, chrono::Utc::now()).await.context("failed to list stale pending tasks")?;

    let mut redispatched = 0u32;
    for task in &stale {
        if dispatcher.redispatch(task.id, task.retry_count).await.is_ok() {
            redispatched += 1;
        }
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&json!({ "found": stale.len(), "redispatched": redispatched }))?);
    } else {
        println!("Found {} stale pending task(s), re-dispatched {}", stale.len(), redispatched);
    }
    Ok(())
}
