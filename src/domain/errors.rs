//! Domain errors for the image job engine.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("job not found: {0}")]
    JobNotFound(Uuid),

    #[error("task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("image not found: {0}")]
    ImageNotFound(Uuid),

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("object store error: {0}")]
    ObjectStoreError(String),

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("job already terminal: {0}")]
    JobAlreadyTerminal(Uuid),

    #[error("queue dispatch error: {0}")]
    QueueError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
