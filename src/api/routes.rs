use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Catalog
        .route("/upload-data", post(handlers::upload_data))
        .route("/content", get(handlers::get_content))
        .route("/dataset", get(handlers::get_dataset))
        // Recommendations
        .route("/recommend", post(handlers::recommend))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
