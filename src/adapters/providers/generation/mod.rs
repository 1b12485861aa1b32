//! Image generation provider adapters (spec §4.6).

mod http;
mod mock;

pub use http::{HttpGenerationConfig, HttpGenerationProvider};
pub use mock::MockGenerationProvider;
