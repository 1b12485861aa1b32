//! End-to-end coverage of the in-process path: Dispatcher.submit drives
//! tasks through the full TaskPipeline via the bounded worker pool, and the
//! Status API reflects the converged job state once every task has run.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use imagejob::adapters::object_store::LocalFsObjectStore;
use imagejob::adapters::providers::embedding::MockEmbeddingProvider;
use imagejob::adapters::providers::generation::MockGenerationProvider;
use imagejob::adapters::providers::vision::MockVisionProvider;
use imagejob::domain::errors::DomainError;
use imagejob::domain::models::config::Config;
use imagejob::domain::models::{JobStatus, Style, TaskStatus};
use imagejob::domain::ports::generation_provider::{GenerationProvider, GenerationResult, PollOutcome, ProviderHandle};
use imagejob::domain::ports::image_repository::ImageRepository;
use imagejob::domain::ports::job_repository::JobRepository;
use imagejob::domain::ports::object_store::ObjectStore;
use imagejob::domain::ports::task_repository::TaskRepository;
use imagejob::infrastructure::database::{DatabaseConnection, ImageRepositoryImpl, JobRepositoryImpl, TaskRepositoryImpl};
use imagejob::services::adapter_registry::AdapterRegistry;
use imagejob::services::dispatcher::Dispatcher;
use imagejob::services::status_api::StatusApi;
use imagejob::services::task_pipeline::TaskPipeline;

/// Fails the first `failures_remaining` generation attempts with a
/// transient provider error, then delegates to the real mock. Used to
/// exercise automatic retry redispatch without waiting on a real provider.
struct FlakyGenerationProvider {
    failures_remaining: AtomicU32,
    inner: MockGenerationProvider,
}

impl FlakyGenerationProvider {
    fn new(failures: u32) -> Self {
        Self { failures_remaining: AtomicU32::new(failures), inner: MockGenerationProvider::new() }
    }
}

#[async_trait]
impl GenerationProvider for FlakyGenerationProvider {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn is_async(&self) -> bool {
        false
    }

    async fn generate(&self, prompt: &str, style: &Style, width: u32, height: u32) -> Result<GenerationResult, DomainError> {
        if self.failures_remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n - 1) } else { None }).is_ok() {
            return Err(DomainError::ProviderError("503: temporarily overloaded".into()));
        }
        self.inner.generate(prompt, style, width, height).await
    }

    async fn poll(&self, handle: &ProviderHandle) -> Result<PollOutcome, DomainError> {
        self.inner.poll(handle).await
    }

    fn is_retryable(&self, _err: &DomainError) -> bool {
        true
    }
}

struct Harness {
    dispatcher: Dispatcher,
    status_api: StatusApi,
    job_repo: Arc<dyn JobRepository>,
    task_repo: Arc<dyn TaskRepository>,
    pipeline: Arc<TaskPipeline>,
    _dir: tempfile::TempDir,
    _db: DatabaseConnection,
}

async fn harness(worker_concurrency: usize) -> Harness {
    harness_with_generation(worker_concurrency, Arc::new(MockGenerationProvider::new())).await
}

async fn harness_with_generation(worker_concurrency: usize, generation: Arc<dyn GenerationProvider>) -> Harness {
    let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let pool = db.pool().clone();
    let job_repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(pool.clone()));
    let task_repo: Arc<dyn TaskRepository> = Arc::new(TaskRepositoryImpl::new(pool.clone()));
    let image_repo: Arc<dyn ImageRepository> = Arc::new(ImageRepositoryImpl::new(pool));
    let dir = tempfile::tempdir().unwrap();
    let object_store: Arc<dyn ObjectStore> = Arc::new(LocalFsObjectStore::new(dir.path().to_path_buf()));
    let adapters = Arc::new(AdapterRegistry { generation, vision: Arc::new(MockVisionProvider::new()), embedding: Arc::new(MockEmbeddingProvider::new()) });
    let pipeline = Arc::new(TaskPipeline::new(task_repo.clone(), job_repo.clone(), image_repo, object_store, adapters, &Config::default()));
    let dispatcher = Dispatcher::in_process(job_repo.clone(), task_repo.clone(), pipeline.clone(), worker_concurrency, Config::default().retry);
    let status_api = StatusApi::new(job_repo.clone(), task_repo.clone());
    Harness { dispatcher, status_api, job_repo, task_repo, pipeline, _dir: dir, _db: db }
}

async fn wait_for_terminal(status_api: &StatusApi, job_id: uuid::Uuid) -> imagejob::services::status_api::JobStatusView {
    // The mock generation provider still runs a real 2048x2048 resize and
    // JPEG-encode per size preset, which dominates wall-clock time in an
    // unoptimized test build — give it a generous budget.
    for _ in 0..600 {
        let view = status_api.get(job_id).await.unwrap();
        if matches!(view.status, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    panic!("job {job_id} did not reach a terminal state in time");
}

#[tokio::test]
async fn a_multi_prompt_batch_converges_to_completed_with_full_progress() {
    let h = harness(2).await;

    let job = h
        .dispatcher
        .submit(&["a red sneaker".to_string(), "a blue mug".to_string(), "a green hat".to_string()], Style::default(), 2)
        .await
        .unwrap();
    assert_eq!(job.total_tasks, 6);

    let view = wait_for_terminal(&h.status_api, job.id).await;
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.completed_tasks, 6);
    assert_eq!(view.failed_tasks, 0);
    assert!((view.progress_percentage - 100.0).abs() < 0.01);

    let tasks = h.task_repo.list_by_job(job.id).await.unwrap();
    assert_eq!(tasks.len(), 6);
    assert!(tasks.iter().all(|t| t.status == TaskStatus::Completed && t.image_id.is_some()));

    h.dispatcher.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn worker_concurrency_of_one_still_completes_every_task() {
    let h = harness(1).await;

    let job = h.dispatcher.submit(&["a lone chair".to_string()], Style::default(), 4).await.unwrap();
    let view = wait_for_terminal(&h.status_api, job.id).await;

    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.completed_tasks, 4);

    h.dispatcher.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn cancelling_a_job_races_the_worker_but_always_reaches_a_terminal_state() {
    let h = harness(1).await;

    let job = h.dispatcher.submit(&["a doomed vase".to_string()], Style::default(), 1).await.unwrap();
    // Racing the in-process worker: cancel immediately after submit, then
    // let whichever side won (cancel-before-claim or claim-before-cancel)
    // run to a terminal state. Either way the job must finish, never hang.
    let _ = h.job_repo.cancel(job.id, chrono::Utc::now()).await;

    let view = wait_for_terminal(&h.status_api, job.id).await;
    assert!(matches!(view.status, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled));

    h.dispatcher.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn reconcile_sweep_redispatches_a_task_that_never_reached_the_channel() {
    let h = harness(0).await;

    // worker_concurrency of 0 means the distributor never hands out a
    // permit, so a submitted task sits pending forever until something
    // re-dispatches it — modeling a worker restart that dropped the
    // in-process channel's contents.
    let job = h.dispatcher.submit(&["an orphaned task".to_string()], Style::default(), 1).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let still_pending = h.status_api.get(job.id).await.unwrap();
    assert_eq!(still_pending.status, JobStatus::Pending);

    let stale = h.task_repo.list_stale_pending(0, chrono::Utc::now()).await.unwrap();
    assert_eq!(stale.len(), 1);
    h.dispatcher.shutdown(Duration::from_secs(1)).await;

    // Hand the stale task to a fresh dispatcher with real capacity over the
    // same repos, as the `reconcile` CLI command does against a
    // freshly-started worker.
    let fresh_dispatcher = Dispatcher::in_process(h.job_repo.clone(), h.task_repo.clone(), h.pipeline.clone(), 2, Config::default().retry);
    fresh_dispatcher.redispatch(stale[0].id, stale[0].retry_count).await.unwrap();
    let view = wait_for_terminal(&h.status_api, job.id).await;
    assert_eq!(view.status, JobStatus::Completed);

    fresh_dispatcher.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn a_generator_that_fails_twice_then_succeeds_converges_without_manual_intervention() {
    // A retryable generation failure resets the task to pending and the
    // in-process distributor redispatches it itself — no reconcile sweep
    // or worker restart required.
    let generation = Arc::new(FlakyGenerationProvider::new(2));
    let h = harness_with_generation(2, generation).await;

    let job = h.dispatcher.submit(&["a resilient kettle".to_string()], Style::default(), 1).await.unwrap();
    let view = wait_for_terminal(&h.status_api, job.id).await;

    assert_eq!(view.status, JobStatus::Completed);
    let tasks = h.task_repo.list_by_job(job.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert_eq!(tasks[0].retry_count, 2);

    h.dispatcher.shutdown(Duration::from_secs(5)).await;
}
