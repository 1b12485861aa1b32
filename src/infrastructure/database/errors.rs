//! Database-layer errors, converted into `DomainError` at the repository
//! boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection pool error: {0}")]
    ConnectionPoolError(String),

    #[error("migration error: {0}")]
    MigrationError(String),

    #[error("query error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("row decode error: {0}")]
    RowDecodeError(String),
}

impl From<DatabaseError> for crate::domain::DomainError {
    fn from(err: DatabaseError) -> Self {
        Self::DatabaseError(err.to_string())
    }
}
