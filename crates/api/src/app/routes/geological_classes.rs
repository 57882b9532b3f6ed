use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use lithos_core::{ClassId, SectionId};

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route(
            "/:id",
            get(get_class).put(update_class).delete(delete_class),
        )
}

/// `POST /?sectionId=` appends a class to an existing section.
pub async fn create_class(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SectionIdQuery>,
    Json(body): Json<dto::ClassRequest>,
) -> axum::response::Response {
    let Some(raw) = query.section_id else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_parameter",
            "query parameter 'sectionId' is required",
        );
    };
    let section_id: SectionId = match dto::parse_id(&raw, "section") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class = match body.into_class() {
        Ok(c) => c,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.sections.add_class(section_id, class).await {
        Ok(class) => (StatusCode::CREATED, Json(class)).into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn list_classes(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.sections.list_classes().await {
        Ok(classes) => Json(classes).into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn get_class(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClassId = match dto::parse_id(&id, "geological class") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.sections.get_class(id).await {
        Ok(Some(class)) => Json(class).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("geological class {id} not found"),
        ),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn update_class(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ClassRequest>,
) -> axum::response::Response {
    let id: ClassId = match dto::parse_id(&id, "geological class") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class = match body.into_class() {
        Ok(c) => c,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.sections.update_class(id, class).await {
        Ok(class) => Json(class).into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}

pub async fn delete_class(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClassId = match dto::parse_id(&id, "geological class") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.sections.delete_class(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::section_error_to_response(e),
    }
}
