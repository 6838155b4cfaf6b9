use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/articles/analyze", post(handlers::analyze_article))
        .route("/api/state", get(handlers::get_state))
        .route(
            "/api/history",
            get(handlers::get_history).delete(handlers::clear_history),
        )
        .route("/api/cache", delete(handlers::clear_cache))
        .route(
            "/api/preferences",
            get(handlers::get_preferences).put(handlers::put_preferences),
        )
        .route("/api/stats", get(handlers::get_stats))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serves the API on `addr` until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> nn_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state).await).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, ApiError, AppState};
    pub use nn_core::{Article, Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use nn_inference::models::DummyModel;
    use nn_scrapers::{AnalysisPipeline, HtmlScraper, NoopSearch};
    use nn_storage::{MemoryStore, StorageManager};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const STORY: &str = "The city council approved the budget on Monday after a long debate. \
        The council voted seven to two. Officials said the plan funds housing and transit \
        projects over the next three years, and the mayor is expected to sign it this week.";

    fn app_state() -> AppState {
        let storage = StorageManager::new(Arc::new(MemoryStore::new()));
        let pipeline = AnalysisPipeline::new(
            Arc::new(HtmlScraper::new().unwrap()),
            Arc::new(NoopSearch),
            Arc::new(DummyModel::unavailable()),
            storage,
        );
        AppState::new(pipeline)
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let app = create_app(state.clone()).await;
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1_000_000).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_state_is_idle_initially() {
        let state = app_state();
        let (status, body) = send(&state, "GET", "/api/state", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "idle");
    }

    #[tokio::test]
    async fn test_analyze_article_records_history() {
        let state = app_state();
        let article = json!({
            "url": "https://a.com/news/council",
            "title": "Council approves city budget",
            "content": STORY,
            "source": "A Daily"
        });

        let (status, body) = send(&state, "POST", "/api/articles/analyze", Some(article)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["article"]["source"], "A Daily");
        assert_eq!(body["biasLabel"], "Minimal Bias");
        assert_eq!(body["summary"]["method"], "fallback");
        assert!(body["narrative"].is_null());

        let (_, state_body) = send(&state, "GET", "/api/state", None).await;
        assert_eq!(state_body["status"], "complete");

        let (_, history) = send(&state, "GET", "/api/history", None).await;
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["title"], "Council approves city budget");

        let (status, _) = send(&state, "DELETE", "/api/history", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, history) = send(&state, "GET", "/api/history", None).await;
        assert!(history.as_array().unwrap().is_empty());

        let (status, cleared) = send(&state, "DELETE", "/api/cache", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["removed"], 1);
    }

    #[tokio::test]
    async fn test_non_news_is_unprocessable() {
        let state = app_state();
        let article = json!({"url": "https://a.com/login", "title": "Login", "content": "Sign in"});

        let (status, body) = send(&state, "POST", "/api/articles/analyze", Some(article)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("news article"));

        let (_, state_body) = send(&state, "GET", "/api/state", None).await;
        assert_eq!(state_body["status"], "error");
    }

    #[tokio::test]
    async fn test_analyze_rejects_invalid_url() {
        let state = app_state();
        let (status, body) = send(&state, "POST", "/api/analyze", Some(json!({"url": "not a url"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid URL"));
    }

    #[tokio::test]
    async fn test_preferences_round_trip() {
        let state = app_state();
        let (_, defaults) = send(&state, "GET", "/api/preferences", None).await;
        assert_eq!(defaults["minSources"], 3);
        assert_eq!(defaults["autoDetect"], true);

        let updated = json!({
            "autoDetect": false,
            "showBiasScore": true,
            "minSources": 4,
            "preferredSources": ["Reuters"]
        });
        let (status, _) = send(&state, "PUT", "/api/preferences", Some(updated.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (_, stored) = send(&state, "GET", "/api/preferences", None).await;
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_stats() {
        let state = app_state();
        let (status, body) = send(&state, "GET", "/api/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quotaMb"], 10);
        assert_eq!(body["megabytesUsed"], "0.00");
    }
}
