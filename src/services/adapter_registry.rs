//! Name-keyed registry mapping configured provider names to concrete
//! adapters. A small trait plus a registry, per design notes — no
//! inheritance hierarchy.

use std::sync::Arc;

use crate::adapters::providers::embedding::{MockEmbeddingProvider, OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::adapters::providers::generation::{HttpGenerationConfig, HttpGenerationProvider, MockGenerationProvider};
use crate::adapters::providers::vision::{HttpVisionConfig, HttpVisionProvider, MockVisionProvider};
use crate::domain::models::config::ProviderConfig;
use crate::domain::ports::embedding_provider::EmbeddingProvider;
use crate::domain::ports::generation_provider::GenerationProvider;
use crate::domain::ports::vision_provider::VisionProvider;

/// Resolves `config.provider.*` adapter names into constructed instances.
pub struct AdapterRegistry {
    pub generation: Arc<dyn GenerationProvider>,
    pub vision: Arc<dyn VisionProvider>,
    pub embedding: Arc<dyn EmbeddingProvider>,
}

impl AdapterRegistry {
    /// # Panics
    /// Panics if `config` names an adapter this registry does not recognize
    /// — an unresolvable provider name is a startup-time configuration bug,
    /// not a recoverable runtime condition.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            generation: Self::generation_by_name(&config.generation),
            vision: Self::vision_by_name(&config.vision),
            embedding: Self::embedding_by_name(&config.embedding),
        }
    }

    fn generation_by_name(name: &str) -> Arc<dyn GenerationProvider> {
        match name {
            "mock" => Arc::new(MockGenerationProvider::new()),
            "http" => Arc::new(HttpGenerationProvider::new(HttpGenerationConfig::default())),
            other => panic!("unknown generation provider: {other}"),
        }
    }

    fn vision_by_name(name: &str) -> Arc<dyn VisionProvider> {
        match name {
            "mock" => Arc::new(MockVisionProvider::new()),
            "http" => Arc::new(HttpVisionProvider::new(HttpVisionConfig::default())),
            other => panic!("unknown vision provider: {other}"),
        }
    }

    fn embedding_by_name(name: &str) -> Arc<dyn EmbeddingProvider> {
        match name {
            "mock" => Arc::new(MockEmbeddingProvider::new()),
            "openai" => Arc::new(OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::default())),
            other => panic!("unknown embedding provider: {other}"),
        }
    }
}
