//! Dispatcher: validates and persists a batch submission, then hands its
//! tasks off to whichever of the two scheduling modes (spec §5) is
//! configured. Both modes drive the same [`TaskPipeline`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::{DispatchMode, RetryConfig};
use crate::domain::models::{Job, Style, Task, TaskOutcome};
use crate::domain::ports::job_repository::JobRepository;
use crate::domain::ports::task_queue::TaskQueue;
use crate::domain::ports::task_repository::TaskRepository;
use crate::services::retry;
use crate::services::task_pipeline::TaskPipeline;

const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Background handles for the in-process worker pool. `distributor` is
/// taken out of its `Mutex` on `shutdown`, which lets `shutdown` work
/// through a shared `Arc<Dispatcher>` instead of requiring ownership.
struct InProcessWorkers {
    sender: mpsc::UnboundedSender<Uuid>,
    shutdown_tx: broadcast::Sender<()>,
    distributor: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

enum DispatchSink {
    InProcess(InProcessWorkers),
    External(Arc<dyn TaskQueue>),
}

pub struct Dispatcher {
    job_repo: Arc<dyn JobRepository>,
    task_repo: Arc<dyn TaskRepository>,
    retry_config: RetryConfig,
    sink: DispatchSink,
}

impl Dispatcher {
    /// Constructs a dispatcher in in-process mode, spawning a distributor
    /// task that gates concurrent pipeline executions behind a
    /// `worker_concurrency`-sized semaphore (spec §5). The distributor
    /// redispatches `Retrying` outcomes itself, after a
    /// `retry_config`-derived backoff.
    pub fn in_process(job_repo: Arc<dyn JobRepository>, task_repo: Arc<dyn TaskRepository>, pipeline: Arc<TaskPipeline>, worker_concurrency: usize, retry_config: RetryConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let semaphore = Arc::new(Semaphore::new(worker_concurrency));
        let distributor = tokio::spawn(run_distributor(receiver, sender.clone(), pipeline, task_repo.clone(), retry_config, semaphore, shutdown_rx));

        Self { job_repo, task_repo, retry_config, sink: DispatchSink::InProcess(InProcessWorkers { sender, shutdown_tx, distributor: tokio::sync::Mutex::new(Some(distributor)) }) }
    }

    /// Constructs a dispatcher in external-queue mode: submitted tasks are
    /// posted to `queue` for the Worker Endpoint to process out of
    /// process.
    pub fn external(job_repo: Arc<dyn JobRepository>, task_repo: Arc<dyn TaskRepository>, queue: Arc<dyn TaskQueue>, retry_config: RetryConfig) -> Self {
        Self { job_repo, task_repo, retry_config, sink: DispatchSink::External(queue) }
    }

    pub fn mode(&self) -> DispatchMode {
        match &self.sink {
            DispatchSink::InProcess(_) => DispatchMode::InProcess,
            DispatchSink::External(_) => DispatchMode::External,
        }
    }

    /// Validates, persists, and dispatches a batch submission (spec §6's
    /// `POST /admin/jobs`). Prompts are trimmed; an all-whitespace prompt
    /// is a validation error surfaced synchronously.
    pub async fn submit(&self, prompts: &[String], style: Style, count_per_prompt: u32) -> DomainResult<Job> {
        if prompts.is_empty() {
            return Err(DomainError::ValidationFailed("at least one prompt is required".into()));
        }
        if count_per_prompt == 0 {
            return Err(DomainError::ValidationFailed("count_per_prompt must be at least 1".into()));
        }
        let trimmed: Vec<String> = prompts
            .iter()
            .map(|p| p.trim().to_string())
            .map(|p| if p.is_empty() { Err(DomainError::ValidationFailed("prompts must not be empty or whitespace-only".into())) } else { Ok(p) })
            .collect::<Result<_, _>>()?;

        let now = Utc::now();
        let job_id = Uuid::new_v4();
        let total_tasks = u32::try_from(trimmed.len()).unwrap_or(u32::MAX).saturating_mul(count_per_prompt);
        let job = Job::new(job_id, total_tasks, now);

        let tasks: Vec<Task> = trimmed
            .iter()
            .flat_map(|prompt| {
                let style = style.clone();
                (0..count_per_prompt).map(move |_| Task::new(Uuid::new_v4(), job_id, prompt.clone(), style.clone(), now))
            })
            .collect();

        self.job_repo.insert(&job).await?;
        self.task_repo.insert_batch(&tasks).await?;

        self.dispatch(&tasks).await;

        Ok(job)
    }

    async fn dispatch(&self, tasks: &[Task]) {
        match &self.sink {
            DispatchSink::InProcess(workers) => {
                for task in tasks {
                    if workers.sender.send(task.id).is_err() {
                        error!(task_id = %task.id, "in-process dispatch channel closed, task will only run via the stale-pending sweep");
                    }
                }
            }
            DispatchSink::External(queue) => {
                for task in tasks {
                    if let Err(e) = queue.enqueue(task.id, task.retry_count).await {
                        warn!(task_id = %task.id, error = %e, "failed to enqueue task on external queue, it will be picked up by the stale-pending sweep");
                    }
                }
            }
        }
    }

    /// Re-dispatches a single task id, used by the retry path and the
    /// stale-pending reconciler sweep.
    pub async fn redispatch(&self, task_id: Uuid, retry_count: u32) -> DomainResult<()> {
        match &self.sink {
            DispatchSink::InProcess(workers) => {
                workers.sender.send(task_id).map_err(|_| DomainError::ValidationFailed("dispatcher is shutting down".into()))?;
            }
            DispatchSink::External(queue) => queue.enqueue(task_id, retry_count).await?,
        }
        Ok(())
    }

    /// Schedules a delayed redispatch of a task the pipeline reported as
    /// `Retrying`, after a `retry_config`-derived backoff (spec §4.2 step
    /// 7). Used by the worker callback handler, which runs the pipeline
    /// directly rather than through the in-process distributor loop.
    pub fn schedule_retry(self: &Arc<Self>, task_id: Uuid) {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let attempt = dispatcher.task_repo.get(task_id).await.ok().flatten().map_or(0, |t| t.retry_count);
            let delay = retry::backoff_ms(&dispatcher.retry_config, attempt);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if let Err(e) = dispatcher.redispatch(task_id, attempt).await {
                error!(task_id = %task_id, error = %e, "failed to redispatch retrying task");
            }
        });
    }

    /// Stops accepting new in-process work and waits up to `grace` for
    /// in-flight pipeline runs to finish. A no-op in external mode, and a
    /// no-op if already shut down. Takes `&self` so it can be invoked
    /// through a shared `Arc<Dispatcher>`.
    pub async fn shutdown(&self, grace: Duration) {
        if let DispatchSink::InProcess(workers) = &self.sink {
            let _ = workers.shutdown_tx.send(());
            let handle = workers.distributor.lock().await.take();
            if let Some(handle) = handle {
                if tokio::time::timeout(grace, handle).await.is_err() {
                    warn!("dispatcher shutdown grace period elapsed with pipeline runs still in flight");
                }
            }
        }
    }
}

/// Pulls task ids off `receiver` and spawns one pipeline run per task,
/// gated by `semaphore`'s permits — the bounded-concurrency worker pool
/// (spec §5). A `Retrying` outcome is redispatched onto `sender` itself,
/// after a `retry_config`-derived backoff, so retries resume without any
/// external reconciliation.
async fn run_distributor(
    mut receiver: mpsc::UnboundedReceiver<Uuid>,
    sender: mpsc::UnboundedSender<Uuid>,
    pipeline: Arc<TaskPipeline>,
    task_repo: Arc<dyn TaskRepository>,
    retry_config: RetryConfig,
    semaphore: Arc<Semaphore>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            next = receiver.recv() => {
                let Some(task_id) = next else { break };
                let Ok(permit) = semaphore.clone().acquire_owned().await else { break };
                let pipeline = pipeline.clone();
                let task_repo = task_repo.clone();
                let sender = sender.clone();
                tokio::spawn(async move {
                    let outcome = pipeline.run(task_id).await;
                    drop(permit);
                    match outcome {
                        Ok(TaskOutcome::Retrying) => {
                            let attempt = task_repo.get(task_id).await.ok().flatten().map_or(0, |t| t.retry_count);
                            let delay = retry::backoff_ms(&retry_config, attempt);
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            if sender.send(task_id).is_err() {
                                error!(task_id = %task_id, "failed to redispatch retrying task, in-process channel closed");
                            }
                        }
                        Ok(_) => {}
                        Err(e) => error!(task_id = %task_id, error = %e, "pipeline run failed to even enter"),
                    }
                });
            }
        }
    }
}

pub fn default_shutdown_grace() -> Duration {
    DEFAULT_SHUTDOWN_GRACE
}
