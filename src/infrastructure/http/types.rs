//! Request/response DTOs for the admin and worker-callback HTTP surface
//! (spec §6).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::Job;
use crate::services::status_api::{JobDetailView, JobStatusView};

#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub prompts: Vec<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default = "default_count_per_prompt")]
    pub count_per_prompt: u32,
}

const fn default_count_per_prompt() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub status: String,
    pub total_tasks: u32,
    pub created_at: String,
}

impl From<&Job> for JobResponse {
    fn from(job: &Job) -> Self {
        Self { id: job.id, status: job.status.as_str().to_string(), total_tasks: job.total_tasks, created_at: job.created_at.to_rfc3339() }
    }
}

pub type JobStatusResponse = JobStatusView;
pub type JobDetailResponse = JobDetailView;

#[derive(Debug, Deserialize)]
pub struct ProcessTaskRequest {
    pub task_id: Uuid,
    #[serde(default)]
    pub retry_count: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}
