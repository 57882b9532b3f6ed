use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

/// Multipart field carrying the workbook.
const FILE_FIELD: &str = "file";

pub fn router() -> Router {
    Router::new()
        .route("/", post(start_import))
        .route("/:id", get(import_state))
}

pub async fn start_import(
    Extension(services): Extension<Arc<AppServices>>,
    mut multipart: Multipart,
) -> axum::response::Response {
    let upload = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "missing_file",
                    format!("multipart field '{FILE_FIELD}' is required"),
                );
            }
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.body_text());
            }
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) => break (name, bytes),
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.body_text());
            }
        }
    };

    let (name, bytes) = upload;
    let staged = match services.staging.stage(&name, &bytes).await {
        Ok(path) => path,
        Err(e) => return errors::internal_error(e),
    };

    match services.transfer.start_import(staged).await {
        Ok(job) => (
            StatusCode::CREATED,
            Json(dto::JobCreatedResponse { id: job.id }),
        )
            .into_response(),
        Err(e) => errors::job_error_to_response(e),
    }
}

pub async fn import_state(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_job_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.transfer.import_state(id) {
        Ok(state) => Json(dto::JobStateResponse { state }).into_response(),
        Err(e) => errors::job_error_to_response(e),
    }
}
