//! Batch preview/apply endpoints
//!
//! Preview registers a Pending task. Apply marks it Running synchronously and
//! hands the fan-out to the blocking pool; clients poll the status endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{blocking, guard_path};
use crate::error::{ApiError, ApiResult, BatchError};
use crate::models::{BatchField, BatchMode, PreviewEntry, TaskSnapshot, TaskStatusReport};
use crate::AppState;

/// Preview entries returned inline
pub const SAMPLE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub directory: PathBuf,
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub task_id: String,
    pub total_files: usize,
    pub sample_files: Vec<PreviewEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub task_id: String,
    #[serde(default = "default_confirmed")]
    pub confirmed: bool,
}

fn default_confirmed() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyResponse {
    pub task_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub task_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub removed: usize,
}

/// POST /api/batch/preview
pub async fn preview_batch(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let field: BatchField = request.field.parse()?;
    let mode: BatchMode = match request.mode.as_deref() {
        Some(mode) => mode.parse()?,
        None => BatchMode::default(),
    };
    guard_path(&state, &request.directory)?;

    let engine = Arc::clone(&state.engine);
    let task = blocking(move || {
        Ok(engine.create_task(&request.directory, field, &request.value, mode)?)
    })
    .await?;

    let preview = &task.spec().preview_files;
    Ok(Json(PreviewResponse {
        task_id: task.task_id().to_string(),
        total_files: preview.len(),
        sample_files: preview.iter().take(SAMPLE_LIMIT).cloned().collect(),
    }))
}

/// POST /api/batch/apply
pub async fn apply_batch(
    State(state): State<AppState>,
    Json(request): Json<ApplyRequest>,
) -> ApiResult<Json<ApplyResponse>> {
    if !request.confirmed {
        return Err(ApiError::BadRequest(
            "Batch apply requires confirmation".to_string(),
        ));
    }

    let task = state
        .tasks
        .get(&request.task_id)
        .ok_or_else(|| BatchError::TaskNotFound(request.task_id.clone()))?;
    let spec = task.spec().clone();
    let files = spec.files();
    let task = state
        .engine
        .start(&request.task_id, files.len(), spec.field, spec.mode)?;
    let status = task.status();

    let engine = Arc::clone(&state.engine);
    let worker_task = Arc::clone(&task);
    let handle = tokio::task::spawn_blocking(move || {
        engine.run(&worker_task, &files, spec.field, &spec.value, spec.mode)
    });

    let last_error = Arc::clone(&state.last_error);
    let task_id = request.task_id.clone();
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            error!(task_id = %task_id, "Batch worker panicked: {}", e);
            *last_error.write().await = Some(format!("Batch {} failed: {}", task_id, e));
        }
    });

    info!(task_id = %request.task_id, "Batch apply dispatched");
    Ok(Json(ApplyResponse {
        task_id: request.task_id,
        status: status.as_str().to_string(),
    }))
}

/// GET /api/batch/status/:task_id
pub async fn batch_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskStatusReport>> {
    let task = state
        .tasks
        .get(&task_id)
        .ok_or(BatchError::TaskNotFound(task_id))?;
    Ok(Json(task.snapshot().status_report(state.error_tail)))
}

/// GET /api/batch/tasks
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskSnapshot>> {
    let mut snapshots: Vec<TaskSnapshot> =
        state.tasks.list_all().iter().map(|t| t.snapshot()).collect();
    snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(snapshots)
}

/// DELETE /api/batch/:task_id
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.tasks.delete(&task_id) {
        return Err(BatchError::TaskNotFound(task_id).into());
    }
    Ok(Json(DeleteResponse {
        deleted: true,
        task_id,
    }))
}

/// POST /api/batch/cleanup
pub async fn cleanup_tasks(State(state): State<AppState>) -> Json<CleanupResponse> {
    let removed = state.tasks.sweep_expired();
    if removed > 0 {
        info!(removed, "Expired batch tasks removed");
    }
    Json(CleanupResponse { removed })
}

/// Build batch routes
pub fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/api/batch/preview", post(preview_batch))
        .route("/api/batch/apply", post(apply_batch))
        .route("/api/batch/status/:task_id", get(batch_status))
        .route("/api/batch/tasks", get(list_tasks))
        .route("/api/batch/cleanup", post(cleanup_tasks))
        .route("/api/batch/:task_id", delete(delete_task))
}
