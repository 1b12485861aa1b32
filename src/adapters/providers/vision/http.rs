//! HTTP-backed vision (tagging) provider adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::ports::vision_provider::{VisionProvider, VisionResult};

#[derive(Debug, Clone)]
pub struct HttpVisionConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub confidence_threshold: f32,
}

impl Default for HttpVisionConfig {
    fn default() -> Self {
        Self { base_url: "http://127.0.0.1:9001".to_string(), api_key: None, timeout_secs: 60, confidence_threshold: 0.5 }
    }
}

pub struct HttpVisionProvider {
    config: HttpVisionConfig,
    client: Arc<reqwest::Client>,
}

impl HttpVisionProvider {
    pub fn new(config: HttpVisionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self { config, client: Arc::new(client) }
    }
}

#[derive(Debug, Serialize)]
struct TagRequest<'a> {
    image_base64: String,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct TagResponse {
    tags: Vec<TagEntry>,
    description: String,
    category: String,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    label: String,
    confidence: f32,
}

#[async_trait]
impl VisionProvider for HttpVisionProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    fn confidence_threshold(&self) -> f32 {
        self.config.confidence_threshold
    }

    async fn tag(&self, image_bytes: &[u8], prompt: &str) -> Result<VisionResult, DomainError> {
        use base64::Engine;
        let url = format!("{}/tag", self.config.base_url);
        let body = TagRequest { image_base64: base64::engine::general_purpose::STANDARD.encode(image_bytes), prompt };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| DomainError::ProviderError(format!("network: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::ProviderError(format!("{}: {body}", status.as_u16())));
        }

        let parsed: TagResponse = response.json().await.map_err(|e| DomainError::SerializationError(format!("tag response: {e}")))?;

        Ok(VisionResult {
            tags: parsed.tags.into_iter().map(|t| (t.label, t.confidence)).collect(),
            description: parsed.description,
            category: parsed.category,
            confidence: parsed.confidence,
        })
    }

    fn is_retryable(&self, err: &DomainError) -> bool {
        match err {
            DomainError::ProviderError(msg) if msg.starts_with("network:") => true,
            DomainError::ProviderError(msg) => msg.split(':').next().and_then(|s| s.parse::<u16>().ok()).is_some_and(|code| code == 429 || code >= 500),
            _ => false,
        }
    }
}
