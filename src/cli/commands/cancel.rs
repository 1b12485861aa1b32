//! `cancel` command handler.

use anyhow::{Context, Result};
use serde_json::json;
use uuid::Uuid;

use crate::domain::ports::job_repository::JobRepository;

pub async fn handle(job_repo: &dyn JobRepository, job_id: Uuid, json_output: bool) -> Result<()> {
    let job = job_repo.cancel(job_id, chrono::Utc::now()).await.context("failed to cancel job")?.ok_or_else(|| anyhow::anyhow!("job {job_id} not found"))?;

    if json_output {
        let output = json!({ "id": job.id, "status": job.status.as_str() });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Cancelled job {}", job.id);
    }
    Ok(())
}
