//! `status` command handler.

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::services::StatusApi;

pub async fn handle(status_api: &StatusApi, job_id: Uuid, detail: bool, json_output: bool) -> Result<()> {
    if detail {
        let view = status_api.get_detail(job_id).await.context("failed to load job detail")?;
        if json_output {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            println!("job {} — {} ({}/{} completed, {} failed)", view.status.id, view.status.status.as_str(), view.status.completed_tasks, view.status.total_tasks, view.status.failed_tasks);
            for task in &view.tasks {
                let err = task.error_message.as_deref().unwrap_or("-");
                println!("  task {} — {} (retries={}, error={})", task.id, task.status.as_str(), task.retry_count, err);
            }
        }
    } else {
        let view = status_api.get(job_id).await.context("failed to load job status")?;
        if json_output {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            println!("job {} — {} ({:.1}% complete, {}/{} done, {} failed)", view.id, view.status.as_str(), view.progress_percentage, view.completed_tasks, view.total_tasks, view.failed_tasks);
        }
    }
    Ok(())
}
