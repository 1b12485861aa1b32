//! Embedding provider port.
//!
//! Grounded directly on the teacher's `domain::ports::embedding` trait
//! shape (`EmbeddingProvider`, batch support, dimension/name accessors),
//! narrowed to the single-embed path this spec's pipeline uses.

use async_trait::async_trait;

use crate::domain::errors::DomainError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    fn is_retryable(&self, err: &DomainError) -> bool;
}
