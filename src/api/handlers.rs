use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{MinimalTitle, ResultsEnvelope},
    services::{
        spotlight::pick_spotlight,
        title_search::{autocomplete, search_results, ResultsPage, ResultsQuery},
        titles::{minimal_title, title_record},
    },
};

use super::AppState;

// Request types

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverParams {
    pub seed: Option<String>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Autocomplete suggestions
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<ResultsEnvelope> {
    let query = params.q.unwrap_or_default();
    let results = autocomplete(state.provider.as_ref(), &query).await;
    Json(ResultsEnvelope { results })
}

/// Paged, filtered results
pub async fn results(
    State(state): State<AppState>,
    Query(params): Query<ResultsQuery>,
) -> Json<ResultsPage> {
    Json(search_results(state.provider.as_ref(), &params).await)
}

/// Discover grid: sampled movies followed by sampled series
pub async fn discover(
    State(state): State<AppState>,
    Query(params): Query<DiscoverParams>,
) -> Json<ResultsEnvelope> {
    let results = match state.discover.build_or_refresh(params.seed.as_deref()).await {
        Ok(sample) => sample.into_titles(),
        Err(e) => {
            tracing::warn!(error = %e, seed = ?params.seed, "Discover pool unavailable");
            Vec::new()
        }
    };

    Json(ResultsEnvelope { results })
}

/// Featured title, `{}` when none could be picked
pub async fn spotlight(State(state): State<AppState>) -> AppResult<Json<Value>> {
    match pick_spotlight(state.provider.as_ref()).await {
        Some(spotlight) => Ok(Json(serde_json::to_value(spotlight)?)),
        None => Ok(Json(json!({}))),
    }
}

pub async fn title_min(State(state): State<AppState>, Path(id): Path<String>) -> Json<MinimalTitle> {
    Json(minimal_title(state.provider.as_ref(), &id).await)
}

pub async fn title(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Value>> {
    let record = title_record(state.provider.as_ref(), &id).await?;
    Ok(Json(record))
}

/// Title record as a pretty-printed `{id}.json` attachment
pub async fn download(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = file
        .strip_suffix(".json")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::NotFound(format!("No download named {}", file)))?;

    let record = title_record(state.provider.as_ref(), id).await?;
    let body = serde_json::to_string_pretty(&record)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.json\"", id),
            ),
        ],
        body,
    ))
}
