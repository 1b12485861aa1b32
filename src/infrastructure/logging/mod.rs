//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber, configured from
//! [`crate::domain::models::config::LoggingConfig`].

mod logger;

pub use logger::LoggerImpl;

pub use tracing::{debug, error, info, instrument, trace, warn};
