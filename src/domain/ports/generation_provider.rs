//! Generation provider port (spec §4.6).

use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::models::Style;

/// Result of a single `generate` call.
#[derive(Debug, Clone)]
pub enum GenerationResult {
    /// A synchronous provider returns bytes directly.
    Sync(Vec<u8>),
    /// An asynchronous provider returns a handle the pipeline must poll.
    Async(ProviderHandle),
}

/// An opaque handle to an in-flight asynchronous provider job.
#[derive(Debug, Clone)]
pub struct ProviderHandle(pub String);

/// Poll outcome for an asynchronous provider job.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Pending { progress: f32 },
    Completed(Vec<u8>),
    Failed(DomainError),
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_async(&self) -> bool;

    /// Recorded generation cost for the last call, in provider-defined
    /// units (write-only metadata per spec's Open Questions).
    async fn generate(&self, prompt: &str, style: &Style, width: u32, height: u32) -> Result<GenerationResult, DomainError>;

    /// Only called when `is_async()` is true.
    async fn poll(&self, handle: &ProviderHandle) -> Result<PollOutcome, DomainError>;

    /// Classifies an adapter error as retryable or terminal (spec §4.6 /
    /// §7's error-kind taxonomy, narrowed to the two provider buckets).
    fn is_retryable(&self, err: &DomainError) -> bool;
}
