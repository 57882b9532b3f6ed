use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use lithos_infra::jobs::JobError;
use lithos_infra::sections::SectionStoreError;

const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please contact the administrator.";

pub fn job_error_to_response(err: JobError) -> axum::response::Response {
    match err {
        JobError::NotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("job {id} not found"),
        ),
        JobError::InProgress(id) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "in_progress",
            format!("job {id} is still in progress"),
        ),
        other => internal_error(other),
    }
}

pub fn section_error_to_response(err: SectionStoreError) -> axum::response::Response {
    match err {
        SectionStoreError::NotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("section {id} not found"),
        ),
        SectionStoreError::ClassNotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("geological class {id} not found"),
        ),
        SectionStoreError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        other => internal_error(other),
    }
}

/// Log the real cause and answer with a generic 500.
pub fn internal_error(err: impl std::fmt::Display) -> axum::response::Response {
    tracing::error!(error = %err, "request failed");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        GENERIC_MESSAGE,
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
