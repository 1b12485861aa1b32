//! SQLite implementation of [`TaskRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FailureKind, Style, Task, TaskStatus};
use crate::domain::ports::task_repository::{ClaimResult, TaskRepository};

use super::utils::parse_datetime;

pub struct TaskRepositoryImpl {
    pool: SqlitePool,
}

impl TaskRepositoryImpl {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> DomainResult<Task> {
        Ok(Task {
            id: Uuid::parse_str(row.get::<String, _>("id").as_str())
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            job_id: Uuid::parse_str(row.get::<String, _>("job_id").as_str())
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            prompt: row.get::<String, _>("prompt"),
            style: Style::parse(row.get::<String, _>("style").as_str()),
            status: TaskStatus::from_str(row.get::<String, _>("status").as_str())
                .ok_or_else(|| DomainError::SerializationError("unknown task status".into()))?,
            image_id: row
                .get::<Option<String>, _>("image_id")
                .map(|s| Uuid::parse_str(&s).map_err(|e| DomainError::SerializationError(e.to_string())))
                .transpose()?,
            error_message: row.get::<Option<String>, _>("error_message"),
            retry_count: row.get::<i64, _>("retry_count") as u32,
            created_at: parse_datetime(row.get::<String, _>("created_at").as_str())?,
            started_at: row
                .get::<Option<String>, _>("started_at")
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            completed_at: row
                .get::<Option<String>, _>("completed_at")
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
        })
    }
}

#[async_trait]
impl TaskRepository for TaskRepositoryImpl {
    async fn insert_batch(&self, tasks: &[Task]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(DomainError::from)?;
        for task in tasks {
            sqlx::query(
                "INSERT INTO task (id, job_id, prompt, style, status, image_id, error_message, retry_count, created_at, started_at, completed_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(task.id.to_string())
            .bind(task.job_id.to_string())
            .bind(&task.prompt)
            .bind(task.style.as_str())
            .bind(task.status.as_str())
            .bind(task.image_id.map(|id| id.to_string()))
            .bind(&task.error_message)
            .bind(i64::from(task.retry_count))
            .bind(task.created_at.to_rfc3339())
            .bind(task.started_at.map(|t| t.to_rfc3339()))
            .bind(task.completed_at.map(|t| t.to_rfc3339()))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await.map_err(DomainError::from)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Task>> {
        let row = sqlx::query("SELECT * FROM task WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn list_by_job(&self, job_id: Uuid) -> DomainResult<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM task WHERE job_id = ? ORDER BY created_at")
            .bind(job_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_task).collect()
    }

    async fn claim(&self, id: Uuid, lease_seconds: i64, now: DateTime<Utc>) -> DomainResult<ClaimResult> {
        let lease_cutoff = now - Duration::seconds(lease_seconds);
        let row = sqlx::query(
            "UPDATE task SET status = 'running', started_at = ?
             WHERE id = ?
               AND (status = 'pending' OR (status = 'running' AND started_at <= ?))
             RETURNING *",
        )
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .bind(lease_cutoff.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            return Ok(ClaimResult::Claimed);
        }

        let current = self.get(id).await?.ok_or(DomainError::TaskNotFound(id))?;
        Ok(if current.status.is_terminal() {
            ClaimResult::AlreadyTerminal(current.status)
        } else {
            ClaimResult::HeldByAnother
        })
    }

    async fn reset_for_retry(&self, id: Uuid) -> DomainResult<()> {
        sqlx::query("UPDATE task SET status = 'pending', retry_count = retry_count + 1, started_at = NULL WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete(&self, id: Uuid, image_id: Uuid, now: DateTime<Utc>) -> DomainResult<()> {
        sqlx::query("UPDATE task SET status = 'completed', image_id = ?, completed_at = ? WHERE id = ?")
            .bind(image_id.to_string())
            .bind(now.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fail(&self, id: Uuid, kind: FailureKind, message: &str, now: DateTime<Utc>) -> DomainResult<()> {
        sqlx::query("UPDATE task SET status = 'failed', error_message = ?, completed_at = ? WHERE id = ?")
            .bind(format!("{}: {message}", kind.as_str()))
            .bind(now.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_stale_pending(&self, older_than_seconds: i64, now: DateTime<Utc>) -> DomainResult<Vec<Task>> {
        let cutoff = now - Duration::seconds(older_than_seconds);
        let rows = sqlx::query(
            "SELECT t.* FROM task t
             JOIN job j ON j.id = t.job_id
             WHERE t.status = 'pending'
               AND j.status NOT IN ('completed', 'failed', 'cancelled')
               AND t.created_at <= ?
             ORDER BY t.created_at",
        )
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::connection::DatabaseConnection;
    use crate::infrastructure::database::job_repo::JobRepositoryImpl;
    use crate::domain::models::Job;
    use crate::domain::ports::job_repository::JobRepository;

    async fn setup() -> (DatabaseConnection, TaskRepositoryImpl, JobRepositoryImpl, Uuid) {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let task_repo = TaskRepositoryImpl::new(db.pool().clone());
        let job_repo = JobRepositoryImpl::new(db.pool().clone());
        let job_id = Uuid::new_v4();
        job_repo.insert(&Job::new(job_id, 1, Utc::now())).await.unwrap();
        (db, task_repo, job_repo, job_id)
    }

    fn sample_task(job_id: Uuid) -> Task {
        Task::new(Uuid::new_v4(), job_id, "a red sneaker".into(), Style::default(), Utc::now())
    }

    #[tokio::test]
    async fn claim_succeeds_on_pending_task() {
        let (_db, repo, _jobs, job_id) = setup().await;
        let task = sample_task(job_id);
        repo.insert_batch(std::slice::from_ref(&task)).await.unwrap();

        let result = repo.claim(task.id, 600, Utc::now()).await.unwrap();
        assert_eq!(result, ClaimResult::Claimed);

        let reloaded = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, TaskStatus::Running);
        assert!(reloaded.started_at.is_some());
    }

    #[tokio::test]
    async fn claim_rejects_fresh_lease_held_by_another_worker() {
        let (_db, repo, _jobs, job_id) = setup().await;
        let task = sample_task(job_id);
        repo.insert_batch(std::slice::from_ref(&task)).await.unwrap();

        repo.claim(task.id, 600, Utc::now()).await.unwrap();
        let second = repo.claim(task.id, 600, Utc::now()).await.unwrap();
        assert_eq!(second, ClaimResult::HeldByAnother);
    }

    #[tokio::test]
    async fn claim_steals_expired_lease() {
        let (_db, repo, _jobs, job_id) = setup().await;
        let task = sample_task(job_id);
        repo.insert_batch(std::slice::from_ref(&task)).await.unwrap();

        let long_ago = Utc::now() - Duration::seconds(1000);
        repo.claim(task.id, 600, long_ago).await.unwrap();

        let result = repo.claim(task.id, 600, Utc::now()).await.unwrap();
        assert_eq!(result, ClaimResult::Claimed);
    }

    #[tokio::test]
    async fn claim_reports_already_terminal_tasks() {
        let (db, repo, _jobs, job_id) = setup().await;
        let task = sample_task(job_id);
        repo.insert_batch(std::slice::from_ref(&task)).await.unwrap();

        let image_id = Uuid::new_v4();
        sqlx::query("INSERT INTO image (id, task_id, prompt, style, status, tagging_confidence, generation_cost, tagging_cost, pending_cleanup, created_at, updated_at) VALUES (?, ?, ?, ?, 'generating', 0, 0, 0, 0, ?, ?)")
            .bind(image_id.to_string())
            .bind(task.id.to_string())
            .bind(&task.prompt)
            .bind(task.style.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(Utc::now().to_rfc3339())
            .execute(db.pool())
            .await
            .unwrap();

        repo.complete(task.id, image_id, Utc::now()).await.unwrap();
        let result = repo.claim(task.id, 600, Utc::now()).await.unwrap();
        assert_eq!(result, ClaimResult::AlreadyTerminal(TaskStatus::Completed));
    }

    #[tokio::test]
    async fn reset_for_retry_increments_retry_count_and_clears_lease() {
        let (_db, repo, _jobs, job_id) = setup().await;
        let task = sample_task(job_id);
        repo.insert_batch(std::slice::from_ref(&task)).await.unwrap();
        repo.claim(task.id, 600, Utc::now()).await.unwrap();

        repo.reset_for_retry(task.id).await.unwrap();
        let reloaded = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, TaskStatus::Pending);
        assert_eq!(reloaded.retry_count, 1);
        assert!(reloaded.started_at.is_none());
    }

    #[tokio::test]
    async fn list_stale_pending_finds_old_unstarted_tasks() {
        let (_db, repo, _jobs, job_id) = setup().await;
        let mut task = sample_task(job_id);
        task.created_at = Utc::now() - Duration::seconds(7200);
        repo.insert_batch(std::slice::from_ref(&task)).await.unwrap();

        let stale = repo.list_stale_pending(3600, Utc::now()).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, task.id);
    }
}
