//! The Task Pipeline: claim → generate → derive variants → upload → tag →
//! embed → commit (spec §4.2). One sequential driver per task invocation,
//! shared by both the in-process worker pool and the external worker
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::Config;
use crate::domain::models::{
    Description, Embedding, FailureKind, Image, ImageAssets, JobStatus, Style, Tag, TagSource, Task, TaskOutcome, TaskStatus, Variant,
};
use crate::domain::ports::generation_provider::{GenerationResult, PollOutcome, ProviderHandle};
use crate::domain::ports::image_repository::ImageRepository;
use crate::domain::ports::job_repository::{JobRepository, TerminalOutcome};
use crate::domain::ports::object_store::ObjectStore;
use crate::domain::ports::task_repository::{ClaimResult, TaskRepository};
use crate::services::adapter_registry::AdapterRegistry;
use crate::services::{color_extraction, variant_resize};

/// Generation resolution requested before the pipeline derives fixed-size
/// variants from it. Matches the largest size preset so no upscaling is
/// ever needed.
const GENERATION_WIDTH: u32 = 2048;
const GENERATION_HEIGHT: u32 = 2048;

const MAX_POLL_ATTEMPTS: u32 = 60;
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const GENERATION_POLL_BUDGET: Duration = Duration::from_secs(120);

/// A classified, non-fatal pipeline-step failure. Never crosses the
/// pipeline's own boundary — callers of `run` only ever see a
/// [`TaskOutcome`].
struct PipelineFailure {
    kind: FailureKind,
    message: String,
}

impl PipelineFailure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    fn infrastructure(err: DomainError) -> Self {
        Self::new(FailureKind::Infrastructure, err.to_string())
    }

    fn from_provider(retryable: bool, err: &DomainError) -> Self {
        let kind = if retryable { FailureKind::ProviderTransient } else { FailureKind::ProviderTerminal };
        Self::new(kind, err.to_string())
    }
}

pub struct TaskPipeline {
    task_repo: Arc<dyn TaskRepository>,
    job_repo: Arc<dyn JobRepository>,
    image_repo: Arc<dyn ImageRepository>,
    object_store: Arc<dyn ObjectStore>,
    adapters: Arc<AdapterRegistry>,
    lease_seconds: i64,
    max_retries: u32,
    task_budget_seconds: i64,
}

impl TaskPipeline {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        job_repo: Arc<dyn JobRepository>,
        image_repo: Arc<dyn ImageRepository>,
        object_store: Arc<dyn ObjectStore>,
        adapters: Arc<AdapterRegistry>,
        config: &Config,
    ) -> Self {
        Self {
            task_repo,
            job_repo,
            image_repo,
            object_store,
            adapters,
            lease_seconds: 600,
            max_retries: config.max_retries,
            task_budget_seconds: config.task_budget_seconds,
        }
    }

    /// Runs one full pipeline attempt for `task_id`. Never returns an
    /// error for a pipeline-step failure — those are captured, classified,
    /// and reflected in the returned [`TaskOutcome`]. Only a lookup
    /// failure for the task itself (e.g. it does not exist) is an `Err`.
    pub async fn run(&self, task_id: Uuid) -> DomainResult<TaskOutcome> {
        let task = self.task_repo.get(task_id).await?.ok_or(DomainError::TaskNotFound(task_id))?;

        if let Some(JobStatus::Cancelled) = self.job_repo.status(task.job_id).await? {
            self.finalize_failure(&task, &PipelineFailure::new(FailureKind::Cancelled, "job was cancelled")).await?;
            return Ok(TaskOutcome::Failed { kind: FailureKind::Cancelled, message: "job was cancelled".into() });
        }

        let now = Utc::now();
        match self.task_repo.claim(task_id, self.lease_seconds, now).await? {
            ClaimResult::Claimed => {}
            ClaimResult::HeldByAnother => return Ok(TaskOutcome::Retrying),
            ClaimResult::AlreadyTerminal(status) => return Ok(self.outcome_for_terminal_task(&task, status)),
        }
        self.job_repo.mark_running(task.job_id, now).await?;

        let result = tokio::time::timeout(Duration::from_secs(self.task_budget_seconds as u64), self.run_steps(&task)).await;

        let outcome = match result {
            Ok(Ok(image_id)) => {
                let now = Utc::now();
                self.task_repo.complete(task_id, image_id, now).await?;
                self.job_repo.record_task_outcome(task.job_id, TerminalOutcome::Completed, now).await?;
                TaskOutcome::Completed { image_id }
            }
            Ok(Err(failure)) => self.handle_failure(&task, failure).await?,
            Err(_elapsed) => self.handle_failure(&task, PipelineFailure::new(FailureKind::Timeout, "task exceeded its wall-clock budget")).await?,
        };

        Ok(outcome)
    }

    fn outcome_for_terminal_task(&self, task: &Task, status: TaskStatus) -> TaskOutcome {
        match status {
            TaskStatus::Completed => TaskOutcome::Completed { image_id: task.image_id.unwrap_or_default() },
            TaskStatus::Failed => {
                let (kind, message) = parse_stored_error(task.error_message.as_deref().unwrap_or(""));
                TaskOutcome::Failed { kind, message }
            }
            TaskStatus::Pending | TaskStatus::Running => unreachable!("claim only reports AlreadyTerminal for terminal statuses"),
        }
    }

    /// Retries a retryable failure within budget, else terminally fails
    /// the task and records the outcome with the Progress Aggregator.
    async fn handle_failure(&self, task: &Task, failure: PipelineFailure) -> DomainResult<TaskOutcome> {
        if failure.kind.is_retryable() && task.retry_count < self.max_retries {
            self.task_repo.reset_for_retry(task.id).await?;
            return Ok(TaskOutcome::Retrying);
        }
        self.finalize_failure(task, &failure).await?;
        Ok(TaskOutcome::Failed { kind: failure.kind, message: failure.message })
    }

    async fn finalize_failure(&self, task: &Task, failure: &PipelineFailure) -> DomainResult<()> {
        let now = Utc::now();
        self.task_repo.fail(task.id, failure.kind, &failure.message, now).await?;
        if let Some(image) = self.image_repo.get_by_task(task.id).await? {
            self.image_repo.mark_for_cleanup(image.id).await?;
        }
        self.job_repo.record_task_outcome(task.job_id, TerminalOutcome::Failed, now).await?;
        Ok(())
    }

    /// Steps 2 through 7. Returns the committed image id on success.
    async fn run_steps(&self, task: &Task) -> Result<Uuid, PipelineFailure> {
        let image = match self.image_repo.get_by_task(task.id).await.map_err(PipelineFailure::infrastructure)? {
            Some(image) => image,
            None => {
                let image = Image::new(Uuid::new_v4(), task.id, task.prompt.clone(), task.style.as_str().to_string(), Utc::now());
                self.image_repo.create(&image).await.map_err(PipelineFailure::infrastructure)?;
                image
            }
        };
        let image_id = image.id;

        let bytes = self.generate(&task.prompt, &task.style).await?;
        if bytes.is_empty() {
            return Err(PipelineFailure::new(FailureKind::ProviderTerminal, "generation returned empty bytes"));
        }

        let variants_raw = {
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || variant_resize::derive_variants(&bytes))
                .await
                .map_err(|e| PipelineFailure::new(FailureKind::Infrastructure, format!("variant derivation task panicked: {e}")))?
                .map_err(|e| PipelineFailure::new(FailureKind::Validation, e.to_string()))?
        };

        let mut variants = Vec::with_capacity(variants_raw.len());
        for (preset, variant_bytes, width, height) in &variants_raw {
            let path = format!("{image_id}/{}.jpg", preset.as_str());
            self.object_store.put(&path, variant_bytes, "image/jpeg").await.map_err(PipelineFailure::infrastructure)?;
            variants.push(Variant { image_id, preset: *preset, path, size_bytes: variant_bytes.len() as u64, width: *width, height: *height });
        }

        let vision = self
            .adapters
            .vision
            .tag(&bytes, &task.prompt)
            .await
            .map_err(|e| PipelineFailure::from_provider(self.adapters.vision.is_retryable(&e), &e))?;

        let threshold = self.adapters.vision.confidence_threshold();
        let tags: Vec<Tag> = vision
            .tags
            .iter()
            .filter(|(_, confidence)| *confidence >= threshold)
            .map(|(tag, confidence)| Tag { image_id, tag: tag.clone(), confidence: *confidence, source: TagSource::Auto })
            .collect();
        let description = Description { image_id, description: vision.description.clone(), analysis: None, model: self.adapters.vision.name().to_string() };

        let colors = color_extraction::extract_colors(image_id, &bytes).map_err(|e| PipelineFailure::new(FailureKind::Validation, e.to_string()))?;

        let mut sorted_tags: Vec<&str> = tags.iter().map(|t| t.tag.as_str()).collect();
        sorted_tags.sort_unstable();
        let embedding_input = format!("{} {} {} {}", task.prompt, vision.description, vision.category, sorted_tags.join(" "));
        let vector = self
            .adapters
            .embedding
            .embed(&embedding_input)
            .await
            .map_err(|e| PipelineFailure::from_provider(self.adapters.embedding.is_retryable(&e), &e))?;
        let embedding = Embedding { image_id, vector, model: self.adapters.embedding.name().to_string() };

        let assets = ImageAssets { variants, tags, description, colors, embedding };
        self.image_repo.commit_ready(image_id, &assets).await.map_err(PipelineFailure::infrastructure)?;

        Ok(image_id)
    }

    async fn generate(&self, prompt: &str, style: &Style) -> Result<Vec<u8>, PipelineFailure> {
        let generation = &self.adapters.generation;
        let result = generation
            .generate(prompt, style, GENERATION_WIDTH, GENERATION_HEIGHT)
            .await
            .map_err(|e| PipelineFailure::from_provider(generation.is_retryable(&e), &e))?;

        match result {
            GenerationResult::Sync(bytes) => Ok(bytes),
            GenerationResult::Async(handle) => self.poll_until_terminal(&handle).await,
        }
    }

    async fn poll_until_terminal(&self, handle: &ProviderHandle) -> Result<Vec<u8>, PipelineFailure> {
        let generation = &self.adapters.generation;
        let deadline = tokio::time::Instant::now() + GENERATION_POLL_BUDGET;

        for _attempt in 0..MAX_POLL_ATTEMPTS {
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            match generation.poll(handle).await.map_err(|e| PipelineFailure::from_provider(generation.is_retryable(&e), &e))? {
                PollOutcome::Completed(bytes) => return Ok(bytes),
                PollOutcome::Failed(err) => return Err(PipelineFailure::from_provider(generation.is_retryable(&err), &err)),
                PollOutcome::Pending { .. } => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }

        Err(PipelineFailure::new(FailureKind::ProviderTransient, "generation polling exceeded its attempt/time bound"))
    }
}

fn parse_stored_error(stored: &str) -> (FailureKind, String) {
    match stored.split_once(": ") {
        Some((kind, message)) if FailureKind::from_str(kind).is_some() => (FailureKind::from_str(kind).unwrap(), message.to_string()),
        _ => (FailureKind::ProviderTerminal, stored.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::object_store::LocalFsObjectStore;
    use crate::adapters::providers::embedding::MockEmbeddingProvider;
    use crate::adapters::providers::generation::MockGenerationProvider;
    use crate::adapters::providers::vision::MockVisionProvider;
    use crate::domain::models::{Job, Task};
    use crate::infrastructure::database::{DatabaseConnection, ImageRepositoryImpl, JobRepositoryImpl, TaskRepositoryImpl};

    /// Bundles a pipeline plus its backing handles. `_db`/`_dir` keep the
    /// in-memory database and the object-store temp directory alive for
    /// the test's duration; they are otherwise unused.
    struct Harness {
        pipeline: TaskPipeline,
        job_repo: Arc<dyn JobRepository>,
        task_repo: Arc<dyn TaskRepository>,
        job_id: Uuid,
        task_id: Uuid,
        _db: DatabaseConnection,
        _dir: tempfile::TempDir,
    }

    async fn harness() -> Harness {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let pool = db.pool().clone();
        let job_repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(pool.clone()));
        let task_repo: Arc<dyn TaskRepository> = Arc::new(TaskRepositoryImpl::new(pool.clone()));
        let image_repo: Arc<dyn ImageRepository> = Arc::new(ImageRepositoryImpl::new(pool.clone()));
        let dir = tempfile::tempdir().unwrap();
        let object_store: Arc<dyn ObjectStore> = Arc::new(LocalFsObjectStore::new(dir.path().to_path_buf()));
        let adapters = Arc::new(AdapterRegistry {
            generation: Arc::new(MockGenerationProvider::new()),
            vision: Arc::new(MockVisionProvider::new()),
            embedding: Arc::new(MockEmbeddingProvider::new()),
        });

        let now = Utc::now();
        let job_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        job_repo.insert(&Job::new(job_id, 1, now)).await.unwrap();
        task_repo.insert_batch(&[Task::new(task_id, job_id, "a red bicycle".into(), Style::default(), now)]).await.unwrap();

        let pipeline = TaskPipeline::new(task_repo.clone(), job_repo.clone(), image_repo, object_store, adapters, &Config::default());
        Harness { pipeline, job_repo, task_repo, job_id, task_id, _db: db, _dir: dir }
    }

    #[tokio::test]
    async fn successful_run_completes_task_and_job() {
        let h = harness().await;

        let outcome = h.pipeline.run(h.task_id).await.unwrap();
        assert!(matches!(outcome, TaskOutcome::Completed { .. }));

        let task = h.task_repo.get(h.task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);

        let job = h.job_repo.get(h.job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.completed_tasks, 1);
    }

    #[tokio::test]
    async fn rerunning_a_completed_task_is_a_no_op_matching_the_stored_outcome() {
        let h = harness().await;
        let first = h.pipeline.run(h.task_id).await.unwrap();
        let second = h.pipeline.run(h.task_id).await.unwrap();
        match (first, second) {
            (TaskOutcome::Completed { image_id: a }, TaskOutcome::Completed { image_id: b }) => assert_eq!(a, b),
            other => panic!("expected matching Completed outcomes, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_job_fails_task_with_cancelled_kind_and_no_retry() {
        let h = harness().await;
        h.job_repo.cancel(h.job_id, Utc::now()).await.unwrap();

        let outcome = h.pipeline.run(h.task_id).await.unwrap();
        assert!(matches!(outcome, TaskOutcome::Failed { kind: FailureKind::Cancelled, .. }));

        let task = h.task_repo.get(h.task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.retry_count, 0);
    }
}
