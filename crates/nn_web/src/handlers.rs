use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use nn_core::{AnalysisResult, AnalysisState, Article, HistoryEntry, StorageStats, UserPreferences};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

/// An article the client already extracted, e.g. from the open tab.
#[derive(Debug, Deserialize)]
pub struct ArticleRequest {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<AnalysisResult> {
    Ok(Json(state.pipeline.run(&request.url).await?))
}

pub async fn analyze_article(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ArticleRequest>,
) -> ApiResult<AnalysisResult> {
    let article = Article::new(request.url, request.title, request.content, request.source);
    Ok(Json(state.pipeline.analyze_article(article).await?))
}

pub async fn get_state(State(state): State<Arc<AppState>>) -> ApiResult<AnalysisState> {
    Ok(Json(state.storage.get_state().await?))
}

pub async fn get_history(State(state): State<Arc<AppState>>) -> ApiResult<Vec<HistoryEntry>> {
    Ok(Json(state.storage.get_history().await?))
}

pub async fn clear_history(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.storage.clear_history().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> ApiResult<Value> {
    let removed = state.storage.clear_all_cache().await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn get_preferences(State(state): State<Arc<AppState>>) -> ApiResult<UserPreferences> {
    Ok(Json(state.storage.get_preferences().await?))
}

pub async fn put_preferences(
    State(state): State<Arc<AppState>>,
    Json(preferences): Json<UserPreferences>,
) -> ApiResult<UserPreferences> {
    state.storage.save_preferences(&preferences).await?;
    Ok(Json(preferences))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<StorageStats> {
    Ok(Json(state.storage.get_storage_stats().await?))
}
