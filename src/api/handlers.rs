use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::RecommendationItem,
    services::DatasetSummary,
};

use super::AppState;

/// Multipart field carrying the CSV document
const UPLOAD_FIELD: &str = "file";

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub content_title: String,
    pub top_k: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub total_content: usize,
    pub version: u64,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: Vec<String>,
}

// Handlers

/// Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Content Recommender API",
        "status": "running"
    }))
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Replace the catalog with an uploaded CSV and retrain
pub async fn upload_data(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut contents = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {}", e)))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("unreadable upload: {}", e)))?;
            contents = Some(bytes);
        }
    }

    let contents = contents.ok_or_else(|| {
        AppError::InvalidInput(format!("missing multipart field '{}'", UPLOAD_FIELD))
    })?;

    tracing::info!(
        request_id = %request_id,
        bytes = contents.len(),
        "Processing dataset upload"
    );

    let summary = state.recommender.load_csv(contents).await?;

    Ok(Json(UploadResponse {
        message: "Data uploaded and model trained successfully".to_string(),
        total_content: summary.total_content,
        version: summary.version,
    }))
}

/// Get all available content titles
pub async fn get_content(State(state): State<AppState>) -> AppResult<Json<ContentResponse>> {
    let content = state.recommender.list_titles().await?;
    Ok(Json(ContentResponse { content }))
}

/// Describe the active dataset
pub async fn get_dataset(State(state): State<AppState>) -> AppResult<Json<DatasetSummary>> {
    Ok(Json(state.recommender.summary().await?))
}

/// Get recommendations similar to the given title
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<RecommendationItem>>> {
    let top_k = request.top_k.unwrap_or(state.config.default_top_k);

    tracing::info!(
        request_id = %request_id,
        content_title = %request.content_title,
        top_k,
        "Processing recommendation request"
    );

    let items = state
        .recommender
        .recommend(&request.content_title, top_k)
        .await?;

    tracing::info!(
        request_id = %request_id,
        returned = items.len(),
        "Recommendations generated"
    );

    Ok(Json(items))
}
