//! `submit` command handler.

use anyhow::{Context, Result};
use serde_json::json;

use crate::domain::models::Style;
use crate::services::Dispatcher;

pub async fn handle(dispatcher: &Dispatcher, prompts: Vec<String>, style: String, count: u32, json_output: bool) -> Result<()> {
    let style = Style::parse(&style);
    let job = dispatcher.submit(&prompts, style, count).await.context("failed to submit job")?;

    if json_output {
        let output = json!({
            "id": job.id,
            "status": job.status.as_str(),
            "total_tasks": job.total_tasks,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Submitted job {} with {} task(s)", job.id, job.total_tasks);
    }
    Ok(())
}
