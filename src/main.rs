//! imagejob CLI entry point: loads configuration, wires the repositories,
//! adapters, and services together, then dispatches to the requested
//! subcommand.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use imagejob::adapters::object_store::LocalFsObjectStore;
use imagejob::cli::commands::{cancel, reconcile, serve, status, submit, worker};
use imagejob::cli::{Cli, Commands};
use imagejob::domain::models::config::DispatchMode;
use imagejob::domain::ports::image_repository::ImageRepository;
use imagejob::domain::ports::job_repository::JobRepository;
use imagejob::domain::ports::object_store::ObjectStore;
use imagejob::domain::ports::task_queue::TaskQueue;
use imagejob::domain::ports::task_repository::TaskRepository;
use imagejob::infrastructure::config::ConfigLoader;
use imagejob::infrastructure::database::{DatabaseConnection, ImageRepositoryImpl, JobRepositoryImpl, TaskRepositoryImpl};
use imagejob::infrastructure::http::AppState;
use imagejob::infrastructure::logging::LoggerImpl;
use imagejob::infrastructure::queue::HttpTaskQueue;
use imagejob::services::{AdapterRegistry, Dispatcher, StatusApi, TaskPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _logger = LoggerImpl::init(&config.logging).context("failed to initialize logging")?;

    let database_url = format!("sqlite:{}", config.database.path);
    let db = DatabaseConnection::new(&database_url).await.context("failed to connect to database")?;
    db.migrate().await.context("failed to run database migrations")?;
    let pool = db.pool().clone();

    let job_repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(pool.clone()));
    let task_repo: Arc<dyn TaskRepository> = Arc::new(TaskRepositoryImpl::new(pool.clone()));
    let image_repo: Arc<dyn ImageRepository> = Arc::new(ImageRepositoryImpl::new(pool.clone()));
    let object_store: Arc<dyn ObjectStore> = Arc::new(LocalFsObjectStore::new(config.object_store.root.clone()));
    let adapters = Arc::new(AdapterRegistry::from_config(&config.provider));

    let pipeline = Arc::new(TaskPipeline::new(task_repo.clone(), job_repo.clone(), image_repo, object_store, adapters, &config));

    let dispatcher = Arc::new(match config.mode {
        DispatchMode::InProcess => Dispatcher::in_process(job_repo.clone(), task_repo.clone(), pipeline.clone(), config.worker_concurrency, config.retry),
        DispatchMode::External => {
            let queue: Arc<dyn TaskQueue> = Arc::new(HttpTaskQueue::new(&config.queue));
            Dispatcher::external(job_repo.clone(), task_repo.clone(), queue, config.retry)
        }
    });
    let status_api = Arc::new(StatusApi::new(job_repo.clone(), task_repo.clone()));

    match cli.command {
        Commands::Submit { prompts, style, count } => submit::handle(&dispatcher, prompts, style, count, cli.json).await,
        Commands::Status { job_id, detail } => status::handle(&status_api, job_id, detail, cli.json).await,
        Commands::Cancel { job_id } => cancel::handle(job_repo.as_ref(), job_id, cli.json).await,
        Commands::Reconcile { older_than_seconds } => reconcile::handle(&dispatcher, task_repo.as_ref(), older_than_seconds, cli.json).await,
        Commands::Worker => worker::handle(dispatcher.clone(), task_repo.clone()).await,
        Commands::Serve { addr } => {
            let state = AppState::new(dispatcher.clone(), status_api, job_repo, pipeline, config.webhook_secret.clone(), pool);
            serve::handle(state, &addr).await
        }
    }
}
