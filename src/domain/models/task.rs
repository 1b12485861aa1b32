//! Task domain model.
//!
//! A task is the unit of work for a single prompt+index. It traverses the
//! pipeline once per retry and reaches a terminal state at most once per
//! successful worker execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a task in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Generation style. A closed-ish enum with an `Other` escape hatch so new
/// style names a provider supports don't require a schema change, while the
/// well-known ones stay typed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    ProductPhotography,
    Lifestyle,
    Flatlay,
    Illustration,
    Other(String),
}

impl Style {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ProductPhotography => "product_photography",
            Self::Lifestyle => "lifestyle",
            Self::Flatlay => "flatlay",
            Self::Illustration => "illustration",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "product_photography" => Self::ProductPhotography,
            "lifestyle" => Self::Lifestyle,
            "flatlay" => Self::Flatlay,
            "illustration" => Self::Illustration,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Classification of a pipeline-step failure. Not a type hierarchy — a flat
/// classification that the pipeline uses to decide retry vs terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    ProviderTransient,
    ProviderTerminal,
    Infrastructure,
    Cancelled,
    Timeout,
}

impl FailureKind {
    /// Whether the pipeline may retry a failure of this kind, subject to
    /// `retry_count < max_retries`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderTransient | Self::Infrastructure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ProviderTransient => "provider_transient",
            Self::ProviderTerminal => "provider_terminal",
            Self::Infrastructure => "infrastructure",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "validation" => Some(Self::Validation),
            "provider_transient" => Some(Self::ProviderTransient),
            "provider_terminal" => Some(Self::ProviderTerminal),
            "infrastructure" => Some(Self::Infrastructure),
            "cancelled" => Some(Self::Cancelled),
            "timeout" => Some(Self::Timeout),
            _ => None,
        }
    }
}

/// The outcome of one `TaskPipeline::run` invocation.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed { image_id: Uuid },
    Failed { kind: FailureKind, message: String },
    /// The task was reset to `pending` for a retryable failure; it has not
    /// reached a terminal state and the Progress Aggregator must not be
    /// notified.
    Retrying,
}

/// A single prompt+index unit of work within a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub job_id: Uuid,
    pub prompt: String,
    pub style: Style,
    pub status: TaskStatus,
    pub image_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: Uuid, job_id: Uuid, prompt: String, style: Style, now: DateTime<Utc>) -> Self {
        Self {
            id,
            job_id,
            prompt,
            style,
            status: TaskStatus::Pending,
            image_id: None,
            error_message: None,
            retry_count: 0,
            created_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Whether a fresh claim (another worker currently running this task)
    /// has expired its lease, per §4.2's "started_at within lease window"
    /// rule.
    pub fn claim_expired(&self, lease_seconds: i64, now: DateTime<Utc>) -> bool {
        match self.started_at {
            Some(started) => (now - started).num_seconds() >= lease_seconds,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_round_trips_known_values() {
        for s in ["product_photography", "lifestyle", "flatlay", "illustration"] {
            assert_eq!(Style::parse(s).as_str(), s);
        }
    }

    #[test]
    fn style_other_preserves_unknown_value() {
        let style = Style::parse("surreal_render");
        assert_eq!(style.as_str(), "surreal_render");
    }

    #[test]
    fn failure_kind_retryability_matches_spec_classification() {
        assert!(FailureKind::ProviderTransient.is_retryable());
        assert!(FailureKind::Infrastructure.is_retryable());
        assert!(!FailureKind::ProviderTerminal.is_retryable());
        assert!(!FailureKind::Validation.is_retryable());
        assert!(!FailureKind::Cancelled.is_retryable());
        assert!(!FailureKind::Timeout.is_retryable());
    }

    #[test]
    fn claim_never_started_is_always_stealable() {
        let task = Task::new(Uuid::new_v4(), Uuid::new_v4(), "a cat".into(), Style::default(), Utc::now());
        assert!(task.claim_expired(600, Utc::now()));
    }

    #[test]
    fn fresh_claim_is_not_expired() {
        let mut task = Task::new(Uuid::new_v4(), Uuid::new_v4(), "a cat".into(), Style::default(), Utc::now());
        task.started_at = Some(Utc::now());
        assert!(!task.claim_expired(600, Utc::now()));
    }
}
