//! OpenAI embedding provider adapter.
//!
//! Compatible with any OpenAI-style `/v1/embeddings` endpoint (OpenAI
//! itself, Azure OpenAI, or a local server speaking the same API).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::ports::embedding_provider::EmbeddingProvider;

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API key. Falls back to the `OPENAI_API_KEY` env var.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_secs: 30,
        }
    }
}

impl OpenAiEmbeddingConfig {
    fn resolved_api_key(&self) -> Result<String, DomainError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| DomainError::ProviderError("OPENAI_API_KEY not set and no api_key configured".to_string()))
    }
}

pub struct OpenAiEmbeddingProvider {
    config: OpenAiEmbeddingConfig,
    client: Arc<reqwest::Client>,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: OpenAiEmbeddingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self { config, client: Arc::new(client) }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let api_key = self.config.resolved_api_key()?;
        let url = format!("{}/embeddings", self.config.base_url);
        let body = EmbeddingsRequest { model: &self.config.model, input: vec![text] };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::ProviderError(format!("network: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::ProviderError(format!("{}: {body}", status.as_u16())));
        }

        let mut parsed: EmbeddingsResponse =
            response.json().await.map_err(|e| DomainError::SerializationError(format!("embedding response: {e}")))?;

        parsed.data.pop().map(|d| d.embedding).ok_or_else(|| DomainError::ProviderError("empty embedding response".into()))
    }

    fn is_retryable(&self, err: &DomainError) -> bool {
        match err {
            DomainError::ProviderError(msg) if msg.starts_with("network:") => true,
            DomainError::ProviderError(msg) => msg.split(':').next().and_then(|s| s.parse::<u16>().ok()).is_some_and(|code| code == 429 || code >= 500),
            _ => false,
        }
    }
}
