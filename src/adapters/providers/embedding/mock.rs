//! Deterministic embedding provider for tests and local development.

use async_trait::async_trait;
use std::hash::{Hash, Hasher};

use crate::domain::errors::DomainError;
use crate::domain::ports::embedding_provider::EmbeddingProvider;

const DIMENSION: usize = 32;

#[derive(Debug, Default)]
pub struct MockEmbeddingProvider;

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        Ok((0..DIMENSION)
            .map(|i| {
                let bit = (seed.rotate_left(i as u32 * 7)) & 0xFFFF;
                (bit as f32 / f32::from(u16::MAX)) * 2.0 - 1.0
            })
            .collect())
    }

    fn is_retryable(&self, _err: &DomainError) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedding_has_configured_dimension() {
        let provider = MockEmbeddingProvider::new();
        let vector = provider.embed("a red sneaker").await.unwrap();
        assert_eq!(vector.len(), DIMENSION);
    }

    #[tokio::test]
    async fn same_text_is_deterministic() {
        let provider = MockEmbeddingProvider::new();
        assert_eq!(provider.embed("a mug").await.unwrap(), provider.embed("a mug").await.unwrap());
    }

    #[tokio::test]
    async fn different_text_differs() {
        let provider = MockEmbeddingProvider::new();
        assert_ne!(provider.embed("a mug").await.unwrap(), provider.embed("a vase").await.unwrap());
    }
}
