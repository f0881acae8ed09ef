use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{Filters, RecommendationResult},
    routes::AppState,
    services::filters::{get_available_filters, FilterCatalog},
};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub query: String,
    #[serde(default)]
    pub count: Option<i64>,
    /// Older clients send the count under this name
    #[serde(default)]
    pub max_recommendations: Option<i64>,
    #[serde(flatten)]
    pub filters: Filters,
}

impl RecommendationRequest {
    fn requested_count(&self) -> Option<i64> {
        self.count.or(self.max_recommendations)
    }
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResult>> {
    let result = state
        .pipeline
        .generate_recommendations(&request.query, request.requested_count(), &request.filters)
        .await?;
    Ok(Json(result))
}

/// Five recommendations; any count in the body is ignored
pub async fn quick(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResult>> {
    let result = state
        .pipeline
        .quick_recommendations(&request.query, &request.filters)
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Query-string variant: `?q=...&limit=...`, no filters
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<RecommendationResult>> {
    let result = state
        .pipeline
        .search_recommendations(&params.q, params.limit)
        .await?;
    Ok(Json(result))
}

/// Available filter values with descriptions
pub async fn filters() -> Json<FilterCatalog> {
    Json(get_available_filters())
}
