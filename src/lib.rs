//! Durable, bounded-concurrency batch image-generation job engine.
//!
//! A batch submission (a job) fans out into prompt+index tasks; each task
//! runs the same pipeline (generate, derive size-preset variants, upload,
//! tag, extract colors, embed, commit) exactly once to a terminal state,
//! whether driven by an in-process worker pool or an external queue and
//! stateless worker endpoint.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use infrastructure::database::DatabaseConnection;
