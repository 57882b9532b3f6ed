//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (job store, section store, worker pool)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Jobs started through the router run on the calling tokio runtime.
pub async fn build_app(config: &AppConfig) -> Result<Router, services::StartupError> {
    let services = Arc::new(services::build_services(config).await?);

    let api = routes::router()
        .layer(Extension(services))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1", api)
        .layer(ServiceBuilder::new()))
}
