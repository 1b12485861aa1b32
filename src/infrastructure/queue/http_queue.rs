//! External-queue `TaskQueue` implementation: posts each dispatch to the
//! configured worker endpoint, gated by a token-bucket rate limit and a
//! bounded-concurrency semaphore (spec §5's external-queue scheduling mode).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::QueueConfig;
use crate::domain::ports::task_queue::TaskQueue;

use super::rate_limiter::TokenBucketRateLimiter;

#[derive(Debug, Serialize)]
struct DispatchBody {
    task_id: Uuid,
    retry_count: u32,
}

/// Dispatches tasks to the Worker Endpoint over HTTP. `max_dispatches_per_second`
/// is enforced with a token bucket; `max_concurrent_dispatches` with a
/// semaphore, so a slow worker endpoint sheds dispatch concurrency rather
/// than piling up unbounded in-flight requests.
pub struct HttpTaskQueue {
    client: reqwest::Client,
    worker_url: String,
    rate_limiter: TokenBucketRateLimiter,
    concurrency: Arc<Semaphore>,
}

impl HttpTaskQueue {
    pub fn new(config: &QueueConfig) -> Self {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build().expect("failed to build HTTP client");
        Self {
            client,
            worker_url: config.worker_url.clone(),
            rate_limiter: TokenBucketRateLimiter::new(config.max_dispatches_per_second),
            concurrency: Arc::new(Semaphore::new(config.max_concurrent_dispatches as usize)),
        }
    }
}

#[async_trait]
impl TaskQueue for HttpTaskQueue {
    async fn enqueue(&self, task_id: Uuid, retry_count: u32) -> DomainResult<()> {
        let _permit = self.concurrency.acquire().await.map_err(|e| DomainError::QueueError(e.to_string()))?;
        self.rate_limiter.acquire().await;

        let response = self
            .client
            .post(&self.worker_url)
            .json(&DispatchBody { task_id, retry_count })
            .send()
            .await
            .map_err(|e| DomainError::QueueError(format!("dispatch request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DomainError::QueueError(format!("worker endpoint returned {}", response.status())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn enqueue_posts_task_id_and_retry_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/worker"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config = QueueConfig { worker_url: format!("{}/worker", server.uri()), max_concurrent_dispatches: 4, max_dispatches_per_second: 50, ..QueueConfig::default() };
        let queue = HttpTaskQueue::new(&config);
        queue.enqueue(Uuid::new_v4(), 2).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_a_queue_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).and(path("/worker")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

        let config = QueueConfig { worker_url: format!("{}/worker", server.uri()), max_concurrent_dispatches: 4, max_dispatches_per_second: 50, ..QueueConfig::default() };
        let queue = HttpTaskQueue::new(&config);
        let err = queue.enqueue(Uuid::new_v4(), 0).await.unwrap_err();
        assert!(matches!(err, DomainError::QueueError(_)));
    }
}
