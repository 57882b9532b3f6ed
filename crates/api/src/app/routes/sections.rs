use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use lithos_core::SectionId;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_sections).post(create_section))
        .route("/by-code", get(find_by_code))
        .route(
            "/:id",
            get(get_section).put(update_section).delete(delete_section),
        )
}

pub async fn create_section(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SectionRequest>,
) -> axum::response::Response {
    let record = match body.into_record() {
        Ok(r) => r,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.sections.create(record).await {
        Ok(section) => (StatusCode::CREATED, Json(section)).into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn list_sections(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.sections.list().await {
        Ok(sections) => Json(sections).into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn get_section(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SectionId = match dto::parse_id(&id, "section") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.sections.get(id).await {
        Ok(Some(section)) => Json(section).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("section {id} not found"),
        ),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn update_section(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SectionRequest>,
) -> axum::response::Response {
    let id: SectionId = match dto::parse_id(&id, "section") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let record = match body.into_record() {
        Ok(r) => r,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.sections.update(id, record).await {
        Ok(section) => Json(section).into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn delete_section(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SectionId = match dto::parse_id(&id, "section") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.sections.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn find_by_code(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ClassCodeQuery>,
) -> axum::response::Response {
    match services.sections.find_by_class_code(&query.code).await {
        Ok(sections) => Json(sections).into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}
