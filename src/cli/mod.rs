//! Command-line interface module.
//!
//! Thin clap-derived argument definitions plus one handler function per
//! subcommand; `main.rs` owns wiring the loaded [`crate::domain::models::config::Config`]
//! into the services each handler needs.

pub mod commands;
pub mod types;

pub use types::{Cli, Commands};
