use axum::Router;

pub mod export;
pub mod geological_classes;
pub mod import;
pub mod sections;
pub mod system;

/// Router for the versioned API.
pub fn router() -> Router {
    Router::new()
        .nest("/export", export::router())
        .nest("/import", import::router())
        .nest("/sections", sections::router())
        .nest("/geologicalClasses", geological_classes::router())
}
