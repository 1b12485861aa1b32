//! Vision (tagging) provider adapters (spec §4.2 step 5, §4.6).

mod http;
mod mock;

pub use http::{HttpVisionConfig, HttpVisionProvider};
pub use mock::MockVisionProvider;
