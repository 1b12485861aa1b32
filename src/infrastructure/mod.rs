//! Infrastructure: concrete implementations of the domain's ports plus the
//! ambient concerns (configuration, logging, HTTP, queueing) that sit
//! outside the domain layer.

pub mod config;
pub mod database;
pub mod http;
pub mod logging;
pub mod queue;
