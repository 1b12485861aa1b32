//! Axum handlers for the admin API and worker callback (spec §6).

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{Style, TaskOutcome};
use crate::services::task_pipeline::TaskPipeline;

use super::server::AppState;
use super::types::{ErrorResponse, JobResponse, ProcessTaskRequest, SubmitJobRequest};

pub async fn health_check(State(state): State<AppState>) -> StatusCode {
    if state.job_repo_reachable().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn submit_job(State(state): State<AppState>, Json(req): Json<SubmitJobRequest>) -> Result<(StatusCode, Json<JobResponse>), (StatusCode, Json<ErrorResponse>)> {
    let style = req.style.as_deref().map(Style::parse).unwrap_or_default();
    match state.dispatcher.submit(&req.prompts, style, req.count_per_prompt).await {
        Ok(job) => Ok((StatusCode::CREATED, Json(JobResponse::from(&job)))),
        Err(DomainError::ValidationFailed(detail)) => Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(detail)))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(e.to_string())))),
    }
}

pub async fn get_job_status(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<super::types::JobStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.status_api.get(id).await {
        Ok(view) => Ok(Json(view)),
        Err(DomainError::JobNotFound(_)) => Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new("job not found")))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(e.to_string())))),
    }
}

pub async fn get_job_detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<super::types::JobDetailResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.status_api.get_detail(id).await {
        Ok(view) => Ok(Json(view)),
        Err(DomainError::JobNotFound(_)) => Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new("job not found")))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(e.to_string())))),
    }
}

pub async fn cancel_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<JobResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.job_repo.cancel(id, chrono::Utc::now()).await {
        Ok(Some(job)) => Ok(Json(JobResponse::from(&job))),
        Ok(None) => Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new("job not found")))),
        Err(DomainError::JobAlreadyTerminal(_)) => Err((StatusCode::CONFLICT, Json(ErrorResponse::new("job is already terminal")))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(e.to_string())))),
    }
}

/// Worker callback for external-queue mode (spec §4.5, §6). Entering the
/// pipeline successfully — whether the task completes, fails, or is
/// internally retried — is always a 2xx; only a failure to even invoke the
/// pipeline is a 5xx, so the queue's own retry policy is never confused
/// with the pipeline's internal retry policy. A `Retrying` outcome is
/// handed back to the dispatcher, which redispatches it after a backoff
/// instead of leaving it for the stale-pending sweep.
pub async fn process_task(State(state): State<AppState>, headers: HeaderMap, Json(req): Json<ProcessTaskRequest>) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if !state.webhook_secret.is_empty() {
        let provided = headers.get("X-Webhook-Secret").and_then(|v| v.to_str().ok()).unwrap_or("");
        if provided != state.webhook_secret.as_ref() {
            return Err((StatusCode::UNAUTHORIZED, Json(ErrorResponse::new("invalid or missing webhook secret"))));
        }
    }

    let pipeline: &TaskPipeline = &state.pipeline;
    match pipeline.run(req.task_id).await {
        Ok(TaskOutcome::Retrying) => {
            state.dispatcher.schedule_retry(req.task_id);
            Ok(StatusCode::OK)
        }
        Ok(_outcome) => Ok(StatusCode::OK),
        Err(DomainError::TaskNotFound(_)) => Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new("task not found")))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(e.to_string())))),
    }
}
