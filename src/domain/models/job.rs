//! Job domain model.
//!
//! A job is a durable record of one batch submission: a fixed number of
//! tasks, and the two counters the Progress Aggregator alone mutates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses are sinks: no further Progress Aggregator writes
    /// may move a job out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// A durable batch submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub failed_tasks: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: Uuid, total_tasks: u32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            total_tasks,
            completed_tasks: 0,
            failed_tasks: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// `0` when `total_tasks` is `0`, else the percentage of terminal tasks
    /// rounded to one decimal place. Always derived, never stored.
    pub fn progress_percentage(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        let done = f64::from(self.completed_tasks + self.failed_tasks);
        let total = f64::from(self.total_tasks);
        (done / total * 1000.0).round() / 10.0
    }

    /// Derives the terminal status implied by the counters, per §3's
    /// invariant. Returns `None` while the job has not yet seen every task
    /// reach a terminal state.
    pub fn derive_terminal_status(&self) -> Option<JobStatus> {
        if self.completed_tasks + self.failed_tasks != self.total_tasks {
            return None;
        }
        Some(if self.failed_tasks == 0 {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percentage_rounds_to_one_decimal() {
        let mut job = Job::new(Uuid::new_v4(), 7, Utc::now());
        job.completed_tasks = 2;
        job.failed_tasks = 1;
        assert!((job.progress_percentage() - 42.9).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_percentage_is_zero_for_empty_job() {
        let job = Job::new(Uuid::new_v4(), 0, Utc::now());
        assert_eq!(job.progress_percentage(), 0.0);
    }

    #[test]
    fn derive_terminal_status_completed_when_no_failures() {
        let mut job = Job::new(Uuid::new_v4(), 2, Utc::now());
        job.completed_tasks = 2;
        assert_eq!(job.derive_terminal_status(), Some(JobStatus::Completed));
    }

    #[test]
    fn derive_terminal_status_failed_when_any_failure() {
        let mut job = Job::new(Uuid::new_v4(), 2, Utc::now());
        job.completed_tasks = 1;
        job.failed_tasks = 1;
        assert_eq!(job.derive_terminal_status(), Some(JobStatus::Failed));
    }

    #[test]
    fn derive_terminal_status_none_while_in_flight() {
        let mut job = Job::new(Uuid::new_v4(), 2, Utc::now());
        job.completed_tasks = 1;
        assert_eq!(job.derive_terminal_status(), None);
    }
}
