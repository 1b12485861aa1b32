//! Embedding provider adapters.

mod mock;
mod openai;

pub use mock::MockEmbeddingProvider;
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
