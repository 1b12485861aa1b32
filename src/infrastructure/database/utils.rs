//! Shared row-mapping helpers for the sqlite repositories.

use chrono::{DateTime, Utc};

use super::errors::DatabaseError;

/// Parses an RFC3339 timestamp as stored by `sqlx::types::chrono`-free
/// columns (`TEXT`, written via `DateTime::to_rfc3339`).
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::RowDecodeError(format!("invalid timestamp {s:?}: {e}")))
}
