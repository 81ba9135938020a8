use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{ActiveRecommendationsResponse, GenerateResponse},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub limit: Option<u32>,
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Generate, store and return a fresh recommendation for the caller
///
/// The body is taken as raw bytes so a malformed payload still yields the JSON error envelope.
pub async fn generate_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<GenerateResponse>> {
    tracing::info!(request_id = %request_id, "Processing recommendation request");

    let response = state
        .recommendations
        .generate(authorization(&headers), &body)
        .await
        .map_err(|e| {
            tracing::warn!(request_id = %request_id, error = %e, "Recommendation request failed");
            e
        })?;

    tracing::info!(
        request_id = %request_id,
        recommendation_id = %response.recommendation.id,
        "Recommendation request completed"
    );

    Ok(Json(response))
}

/// List the caller's unexpired recommendations
pub async fn active_recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ActiveQuery>, QueryRejection>,
) -> AppResult<Json<ActiveRecommendationsResponse>> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let response = state
        .recommendations
        .active_recommendations(authorization(&headers), query.limit)
        .await?;

    Ok(Json(response))
}
