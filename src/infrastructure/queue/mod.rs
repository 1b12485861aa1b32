//! External-queue task dispatch (spec §5's external-queue scheduling mode).

pub mod http_queue;
pub mod rate_limiter;

pub use http_queue::HttpTaskQueue;
