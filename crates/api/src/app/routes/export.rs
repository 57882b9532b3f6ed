use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(start_export))
        .route("/:id", get(export_state))
        .route("/:id/file", get(export_file))
}

pub async fn start_export(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.transfer.start_export().await {
        Ok(job) => (StatusCode::OK, Json(dto::JobCreatedResponse { id: job.id })).into_response(),
        Err(e) => errors::job_error_to_response(e),
    }
}

pub async fn export_state(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_job_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.transfer.export_state(id) {
        Ok(state) => Json(dto::JobStateResponse { state }).into_response(),
        Err(e) => errors::job_error_to_response(e),
    }
}

pub async fn export_file(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_job_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.transfer.export_artifact(id).await {
        Ok(artifact) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, artifact.content_type),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", artifact.filename),
                ),
            ],
            artifact.bytes,
        )
            .into_response(),
        Err(e) => errors::job_error_to_response(e),
    }
}
