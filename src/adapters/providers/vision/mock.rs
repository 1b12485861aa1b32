//! Deterministic vision provider for tests and local development.
//!
//! Derives tags from the prompt's words rather than inspecting image bytes,
//! so pipeline tests don't need a real vision model.

use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::ports::vision_provider::{VisionProvider, VisionResult};

#[derive(Debug, Default)]
pub struct MockVisionProvider;

impl MockVisionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn confidence_threshold(&self) -> f32 {
        0.5
    }

    async fn tag(&self, image_bytes: &[u8], prompt: &str) -> Result<VisionResult, DomainError> {
        if image_bytes.is_empty() {
            return Err(DomainError::ProviderError("mock vision received empty image".into()));
        }

        let tags: Vec<(String, f32)> = prompt
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|w| w.len() > 2)
            .take(5)
            .map(|w| (w, 0.9))
            .collect();

        Ok(VisionResult {
            description: format!("a generated image of {prompt}"),
            category: tags.first().map_or_else(|| "general".to_string(), |(t, _)| t.clone()),
            confidence: 0.9,
            tags,
        })
    }

    fn is_retryable(&self, _err: &DomainError) -> bool {
        false
    }
}
