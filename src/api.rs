use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use shuttle_axum::axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::error::ReportError;
use crate::jobs::{JobQueue, JobStatus, ReportJob, ReportStore};

#[derive(Clone)]
pub struct AppState {
    queue: JobQueue,
    store: Arc<dyn ReportStore>,
}

impl AppState {
    pub fn new(queue: JobQueue) -> Self {
        let store = queue.store().clone();
        Self { queue, store }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .route("/api/reports/generate", post(generate_report))
        .route("/api/reports/{report_id}/status", get(report_status))
        .route("/api/reports/{report_id}", get(get_report))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Unprocessable(String),
    /// The report id is already known; carries its current status.
    Conflict { report_id: String, status: JobStatus },
    Internal(ReportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(id) => (StatusCode::NOT_FOUND, format!("report {id} not found")),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Conflict { report_id, status } => {
                let body = json!({
                    "detail": format!("report {report_id} already exists"),
                    "report_id": report_id,
                    "status": status,
                });
                return (StatusCode::CONFLICT, Json(body)).into_response();
            }
            ApiError::Internal(e) => {
                error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        ApiError::Internal(e)
    }
}

#[derive(Serialize)]
struct Accepted {
    report_id: String,
    status: &'static str,
}

async fn generate_report(
    State(state): State<AppState>,
    Json(job): Json<ReportJob>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    if job.report_id.trim().is_empty() {
        return Err(ApiError::Unprocessable("report_id must not be empty".into()));
    }
    let report_id = job.report_id.clone();
    if let Some(status) = state.store.get_status(&report_id).await? {
        info!(%report_id, %status, "report id already submitted");
        return Err(ApiError::Conflict { report_id, status });
    }
    state.queue.enqueue(job).await?;
    info!(%report_id, "report generation accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(Accepted {
            report_id,
            status: "accepted",
        }),
    ))
}

#[derive(Serialize)]
struct StatusOut {
    report_id: String,
    status: JobStatus,
}

async fn report_status(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<StatusOut>, ApiError> {
    match state.store.get_status(&report_id).await? {
        Some(status) => Ok(Json(StatusOut { report_id, status })),
        None => Err(ApiError::NotFound(report_id)),
    }
}

async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Response, ApiError> {
    match state.store.get_report(&report_id).await? {
        Some(report) => Ok(Json(report).into_response()),
        None => Err(ApiError::NotFound(report_id)),
    }
}
