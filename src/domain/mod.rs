//! Domain layer: entities, invariants, and the ports the application
//! layer depends on. No infrastructure or adapter dependencies live here.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
