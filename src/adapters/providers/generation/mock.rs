//! Deterministic generation provider used for tests and local development.
//!
//! Produces a synthetic gradient image seeded from the prompt's hash rather
//! than calling out to a real model, so pipeline tests are fast and
//! reproducible.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use image::{ImageBuffer, Rgb};

use crate::domain::errors::DomainError;
use crate::domain::models::Style;
use crate::domain::ports::generation_provider::{GenerationProvider, GenerationResult, PollOutcome, ProviderHandle};

#[derive(Debug, Default)]
pub struct MockGenerationProvider;

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self
    }
}

fn seed_for(prompt: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    prompt.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_async(&self) -> bool {
        false
    }

    async fn generate(&self, prompt: &str, _style: &Style, width: u32, height: u32) -> Result<GenerationResult, DomainError> {
        let seed = seed_for(prompt);
        let r = (seed & 0xFF) as u8;
        let g = ((seed >> 8) & 0xFF) as u8;
        let b = ((seed >> 16) & 0xFF) as u8;

        let image: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
            let t = f64::from(x + y) / f64::from(width + height).max(1.0);
            Rgb([
                (f64::from(r) * (1.0 - t) + 255.0 * t) as u8,
                (f64::from(g) * (1.0 - t) + 255.0 * t) as u8,
                (f64::from(b) * (1.0 - t) + 255.0 * t) as u8,
            ])
        });

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| DomainError::ProviderError(format!("mock generation encode failed: {e}")))?;

        Ok(GenerationResult::Sync(bytes))
    }

    async fn poll(&self, _handle: &ProviderHandle) -> Result<PollOutcome, DomainError> {
        Err(DomainError::ProviderError("mock provider is synchronous, poll is never called".into()))
    }

    fn is_retryable(&self, _err: &DomainError) -> bool {
        false
    }
}
