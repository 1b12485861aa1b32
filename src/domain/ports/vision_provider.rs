//! Vision (tagging) provider port (spec §4.2 step 5, §4.6).

use async_trait::async_trait;

use crate::domain::errors::DomainError;

/// The structured result of a tagging call.
#[derive(Debug, Clone)]
pub struct VisionResult {
    pub tags: Vec<(String, f32)>,
    pub description: String,
    pub category: String,
    pub confidence: f32,
}

#[async_trait]
pub trait VisionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Minimum confidence for a tag to be persisted. Below-threshold tags
    /// are dropped without failing the task (spec edge case).
    fn confidence_threshold(&self) -> f32;

    async fn tag(&self, image_bytes: &[u8], prompt: &str) -> Result<VisionResult, DomainError>;

    fn is_retryable(&self, err: &DomainError) -> bool;
}
