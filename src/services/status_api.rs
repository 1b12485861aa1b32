//! Status API: read-only projections of job/task state (spec §4.4). Never
//! mutates a job or task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Job, JobStatus, TaskStatus};
use crate::domain::ports::job_repository::JobRepository;
use crate::domain::ports::task_repository::TaskRepository;

/// The `get(job_id)` projection.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    pub id: Uuid,
    pub status: JobStatus,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub failed_tasks: u32,
    pub progress_percentage: f64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Job> for JobStatusView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            total_tasks: job.total_tasks,
            completed_tasks: job.completed_tasks,
            failed_tasks: job.failed_tasks,
            progress_percentage: job.progress_percentage(),
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// One row of the `get_detail(job_id)` per-task list.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetailView {
    pub id: Uuid,
    pub status: TaskStatus,
    pub error_message: Option<String>,
    pub image_id: Option<Uuid>,
    pub retry_count: u32,
}

/// The `get_detail(job_id)` projection: the status view plus per-task
/// detail.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetailView {
    #[serde(flatten)]
    pub status: JobStatusView,
    pub tasks: Vec<TaskDetailView>,
}

pub struct StatusApi {
    job_repo: Arc<dyn JobRepository>,
    task_repo: Arc<dyn TaskRepository>,
}

impl StatusApi {
    pub const fn new(job_repo: Arc<dyn JobRepository>, task_repo: Arc<dyn TaskRepository>) -> Self {
        Self { job_repo, task_repo }
    }

    pub async fn get(&self, job_id: Uuid) -> DomainResult<JobStatusView> {
        let job = self.job_repo.get(job_id).await?.ok_or(DomainError::JobNotFound(job_id))?;
        Ok(JobStatusView::from(&job))
    }

    pub async fn get_detail(&self, job_id: Uuid) -> DomainResult<JobDetailView> {
        let job = self.job_repo.get(job_id).await?.ok_or(DomainError::JobNotFound(job_id))?;
        let tasks = self
            .task_repo
            .list_by_job(job_id)
            .await?
            .into_iter()
            .map(|task| TaskDetailView { id: task.id, status: task.status, error_message: task.error_message, image_id: task.image_id, retry_count: task.retry_count })
            .collect();
        Ok(JobDetailView { status: JobStatusView::from(&job), tasks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Style, Task};
    use crate::infrastructure::database::{DatabaseConnection, JobRepositoryImpl, TaskRepositoryImpl};

    struct Harness {
        api: StatusApi,
        job_id: Uuid,
        _db: DatabaseConnection,
    }

    async fn harness() -> Harness {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let pool = db.pool().clone();
        let job_repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(pool.clone()));
        let task_repo: Arc<dyn TaskRepository> = Arc::new(TaskRepositoryImpl::new(pool));

        let now = Utc::now();
        let job_id = Uuid::new_v4();
        job_repo.insert(&Job::new(job_id, 2, now)).await.unwrap();
        task_repo
            .insert_batch(&[
                Task::new(Uuid::new_v4(), job_id, "a mug".into(), Style::default(), now),
                Task::new(Uuid::new_v4(), job_id, "a lamp".into(), Style::default(), now),
            ])
            .await
            .unwrap();

        Harness { api: StatusApi::new(job_repo, task_repo), job_id, _db: db }
    }

    #[tokio::test]
    async fn get_reports_zero_progress_for_a_fresh_job() {
        let h = harness().await;
        let view = h.api.get(h.job_id).await.unwrap();
        assert_eq!(view.progress_percentage, 0.0);
        assert_eq!(view.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn get_unknown_job_is_not_found() {
        let h = harness().await;
        assert!(matches!(h.api.get(Uuid::new_v4()).await, Err(DomainError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn get_detail_includes_one_row_per_task() {
        let h = harness().await;
        let detail = h.api.get_detail(h.job_id).await.unwrap();
        assert_eq!(detail.tasks.len(), 2);
    }
}
