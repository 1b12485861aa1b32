//! HTTP surface: the admin API (submit/status/detail/cancel) and the
//! worker callback endpoint used in external-queue mode (spec §6).

pub mod handlers;
pub mod server;
pub mod types;

pub use server::{build_router, serve, AppState};
