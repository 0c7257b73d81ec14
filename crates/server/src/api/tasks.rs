//! Task API handlers.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use fetchpack_core::{OrchestratorError, TaskStatusReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Optional request body for creating a task
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskBody {
    /// URLs to seed the task with
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Request body for appending URLs
#[derive(Debug, Deserialize)]
pub struct AddUrlBody {
    pub url: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl AddUrlBody {
    fn into_urls(self) -> Vec<String> {
        self.url
            .into_iter()
            .chain(self.urls)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect()
    }
}

/// Response for task creation
#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub task_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TaskErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<TaskErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(TaskErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<OrchestratorError> for TaskErrorResponse {
    fn from(err: OrchestratorError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Map an orchestrator error onto an HTTP status.
fn error_status(err: &OrchestratorError) -> StatusCode {
    match err {
        OrchestratorError::AdmissionRejected { .. } => StatusCode::TOO_MANY_REQUESTS,
        OrchestratorError::NotFound(_)
        | OrchestratorError::ArchiveNotFound(_)
        | OrchestratorError::InvalidTaskId(_) => StatusCode::NOT_FOUND,
        OrchestratorError::Task(_) => StatusCode::CONFLICT,
        OrchestratorError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        OrchestratorError::Cancelled | OrchestratorError::ActorStopped(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        OrchestratorError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_api_error(err: OrchestratorError) -> ApiError {
    let status = error_status(&err);
    if status.is_server_error() {
        error!("Task request failed: {}", err);
    } else {
        debug!("Task request rejected: {}", err);
    }
    (status, Json(TaskErrorResponse::from(err)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new task. The body is optional.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiError> {
    let body: CreateTaskBody = if body.iter().all(u8::is_ascii_whitespace) {
        CreateTaskBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("invalid body: {}", e)))?
    };

    let task_id = state
        .orchestrator()
        .create_task(body.urls)
        .await
        .map_err(into_api_error)?;

    Ok((StatusCode::CREATED, Json(CreateTaskResponse { task_id })))
}

/// Get a task's status
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskStatusReport>, ApiError> {
    state
        .orchestrator()
        .status(&id)
        .await
        .map(Json)
        .map_err(into_api_error)
}

/// Append one or more URLs to a pending task
pub async fn add_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AddUrlBody>,
) -> Result<Json<TaskStatusReport>, ApiError> {
    let urls = body.into_urls();
    if urls.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "no url given"));
    }

    state
        .orchestrator()
        .add_urls(&id, urls)
        .await
        .map(Json)
        .map_err(into_api_error)
}

/// Stream a completed task's archive
pub async fn download_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let archive = state
        .orchestrator()
        .open_archive(&id)
        .await
        .map_err(into_api_error)?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive.file_name),
        ),
        (header::CONTENT_LENGTH, archive.size.to_string()),
    ];
    let body = Body::from_stream(ReaderStream::new(archive.file));

    Ok((headers, body).into_response())
}
