//! SQLite implementation of [`JobRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Job, JobStatus};
use crate::domain::ports::job_repository::{JobRepository, TerminalOutcome};

use super::utils::parse_datetime;

pub struct JobRepositoryImpl {
    pool: SqlitePool,
}

impl JobRepositoryImpl {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> DomainResult<Job> {
        Ok(Job {
            id: Uuid::parse_str(row.get::<String, _>("id").as_str())
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            status: JobStatus::from_str(row.get::<String, _>("status").as_str())
                .ok_or_else(|| DomainError::SerializationError("unknown job status".into()))?,
            total_tasks: row.get::<i64, _>("total_tasks") as u32,
            completed_tasks: row.get::<i64, _>("completed_tasks") as u32,
            failed_tasks: row.get::<i64, _>("failed_tasks") as u32,
            created_at: parse_datetime(row.get::<String, _>("created_at").as_str())?,
            updated_at: parse_datetime(row.get::<String, _>("updated_at").as_str())?,
            completed_at: row
                .get::<Option<String>, _>("completed_at")
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
        })
    }
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn insert(&self, job: &Job) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO job (id, status, total_tasks, completed_tasks, failed_tasks, created_at, updated_at, completed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.to_string())
        .bind(job.status.as_str())
        .bind(i64::from(job.total_tasks))
        .bind(i64::from(job.completed_tasks))
        .bind(i64::from(job.failed_tasks))
        .bind(job.created_at.to_rfc3339())
        .bind(job.updated_at.to_rfc3339())
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Job>> {
        let row = sqlx::query("SELECT * FROM job WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_job).transpose()
    }

    async fn record_task_outcome(&self, id: Uuid, outcome: TerminalOutcome, now: DateTime<Utc>) -> DomainResult<Job> {
        let is_completed = matches!(outcome, TerminalOutcome::Completed);
        let row = sqlx::query(
            "UPDATE job SET
                completed_tasks = completed_tasks + CASE WHEN ?1 THEN 1 ELSE 0 END,
                failed_tasks = failed_tasks + CASE WHEN ?1 THEN 0 ELSE 1 END,
                updated_at = ?2,
                status = CASE
                    WHEN status = 'cancelled' THEN status
                    WHEN (completed_tasks + CASE WHEN ?1 THEN 1 ELSE 0 END
                          + failed_tasks + CASE WHEN ?1 THEN 0 ELSE 1 END) = total_tasks THEN
                        CASE WHEN (failed_tasks + CASE WHEN ?1 THEN 0 ELSE 1 END) = 0 THEN 'completed' ELSE 'failed' END
                    ELSE 'running'
                END,
                completed_at = CASE
                    WHEN status != 'cancelled'
                     AND (completed_tasks + CASE WHEN ?1 THEN 1 ELSE 0 END
                          + failed_tasks + CASE WHEN ?1 THEN 0 ELSE 1 END) = total_tasks
                    THEN ?2
                    ELSE completed_at
                END
             WHERE id = ?3
             RETURNING *",
        )
        .bind(is_completed)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(DomainError::JobNotFound(id))?;
        Self::row_to_job(&row)
    }

    async fn cancel(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Option<Job>> {
        let current = self.get(id).await?;
        let Some(current) = current else {
            return Ok(None);
        };
        if current.status.is_terminal() {
            return Err(DomainError::JobAlreadyTerminal(id));
        }

        let row = sqlx::query(
            "UPDATE job SET status = 'cancelled', updated_at = ?, completed_at = ?
             WHERE id = ? AND status NOT IN ('completed', 'failed', 'cancelled')
             RETURNING *",
        )
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_job).transpose()
    }

    async fn mark_running(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<()> {
        sqlx::query("UPDATE job SET status = 'running', updated_at = ? WHERE id = ? AND status = 'pending'")
            .bind(now.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn status(&self, id: Uuid) -> DomainResult<Option<JobStatus>> {
        let row = sqlx::query("SELECT status FROM job WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            JobStatus::from_str(r.get::<String, _>("status").as_str())
                .ok_or_else(|| DomainError::SerializationError("unknown job status".into()))
        })
        .transpose()
    }
}
