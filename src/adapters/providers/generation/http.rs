//! HTTP-backed generation provider adapter.
//!
//! Talks to any generation service that accepts a JSON prompt/style/size
//! request and returns either image bytes directly (synchronous providers)
//! or a job handle to poll (asynchronous providers).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::models::Style;
use crate::domain::ports::generation_provider::{GenerationProvider, GenerationResult, PollOutcome, ProviderHandle};

#[derive(Debug, Clone)]
pub struct HttpGenerationConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// When true, the service replies with a job handle that must be
    /// polled via `GET {base_url}/jobs/{handle}` instead of inline bytes.
    pub is_async: bool,
}

impl Default for HttpGenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".to_string(),
            api_key: None,
            timeout_secs: 120,
            is_async: false,
        }
    }
}

pub struct HttpGenerationProvider {
    config: HttpGenerationConfig,
    client: Arc<reqwest::Client>,
}

impl HttpGenerationProvider {
    pub fn new(config: HttpGenerationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self { config, client: Arc::new(client) }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    fn classify_status(status: reqwest::StatusCode, body: &str) -> DomainError {
        DomainError::ProviderError(format!("{}: {body}", status.as_u16()))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    style: &'a str,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Handle { job_id: String },
    Inline { image_base64: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum PollResponse {
    Pending { progress: f32 },
    Completed { image_base64: String },
    Failed { message: String },
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    fn is_async(&self) -> bool {
        self.config.is_async
    }

    async fn generate(&self, prompt: &str, style: &Style, width: u32, height: u32) -> Result<GenerationResult, DomainError> {
        let url = format!("{}/generate", self.config.base_url);
        let body = GenerateRequest { prompt, style: style.as_str(), width, height };

        let response = self
            .authed(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| DomainError::ProviderError(format!("network: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| DomainError::SerializationError(format!("generation response: {e}")))?;

        match parsed {
            GenerateResponse::Handle { job_id } => Ok(GenerationResult::Async(ProviderHandle(job_id))),
            GenerateResponse::Inline { image_base64 } => {
                let bytes = base64_decode(&image_base64)?;
                Ok(GenerationResult::Sync(bytes))
            }
        }
    }

    async fn poll(&self, handle: &ProviderHandle) -> Result<PollOutcome, DomainError> {
        let url = format!("{}/jobs/{}", self.config.base_url, handle.0);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| DomainError::ProviderError(format!("network: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        let parsed: PollResponse =
            response.json().await.map_err(|e| DomainError::SerializationError(format!("poll response: {e}")))?;

        Ok(match parsed {
            PollResponse::Pending { progress } => PollOutcome::Pending { progress },
            PollResponse::Completed { image_base64 } => PollOutcome::Completed(base64_decode(&image_base64)?),
            PollResponse::Failed { message } => PollOutcome::Failed(DomainError::ProviderError(message)),
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

fn base64_decode(s: &str) -> Result<Vec<u8>, DomainError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(s).map_err(|e| DomainError::SerializationError(format!("base64 decode: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_5xx_as_retryable() {
        let provider = HttpGenerationProvider::new(HttpGenerationConfig::default());
        let err = DomainError::ProviderError("503: service unavailable".into());
        assert!(provider.is_retryable(&err));
    }

    #[test]
    fn classifies_4xx_as_terminal() {
        let provider = HttpGenerationProvider::new(HttpGenerationConfig::default());
        let err = DomainError::ProviderError("400: bad prompt".into());
        assert!(!provider.is_retryable(&err));
    }

    #[test]
    fn classifies_429_as_retryable() {
        let provider = HttpGenerationProvider::new(HttpGenerationConfig::default());
        let err = DomainError::ProviderError("429: rate limited".into());
        assert!(provider.is_retryable(&err));
    }

    #[test]
    fn classifies_network_errors_as_retryable() {
        let provider = HttpGenerationProvider::new(HttpGenerationConfig::default());
        let err = DomainError::ProviderError("network: connection refused".into());
        assert!(provider.is_retryable(&err));
    }
}
