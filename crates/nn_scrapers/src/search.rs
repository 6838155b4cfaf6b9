//! News search adapters used to discover coverage of the same story.
//!
//! API: `https://newsapi.org/v2/everything`, authenticated with the
//! `apiKey` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use nn_core::{ArticleSearch, Error, RelatedArticle, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub const NEWS_API_URL: &str = "https://newsapi.org/v2";
/// NewsAPI rejects larger pages.
const MAX_PAGE_SIZE: usize = 100;
/// Placeholder NewsAPI returns for withdrawn articles.
const REMOVED: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    source: Option<NewsApiSource>,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}

impl NewsApiArticle {
    fn into_related(self) -> Option<RelatedArticle> {
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let title = self.title.unwrap_or_default();
        if title == REMOVED {
            return None;
        }
        Some(RelatedArticle {
            url,
            title,
            source: self.source.and_then(|s| s.name),
            description: self.description,
            content: self.content,
            published_at: self.published_at,
        })
    }
}

pub struct NewsApiSearch {
    http: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for NewsApiSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiSearch")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl NewsApiSearch {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("news-neutralizer/0.1")
            .build()
            .map_err(|e| Error::Config(format!("Failed to build news HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: NEWS_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ArticleSearch for NewsApiSearch {
    fn name(&self) -> &str {
        "NewsAPI"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RelatedArticle>> {
        let url = format!(
            "{}/everything?q={}&sortBy=relevancy&pageSize={}&language=en&apiKey={}",
            self.base_url,
            urlencoding::encode(query),
            limit.clamp(1, MAX_PAGE_SIZE),
            urlencoding::encode(&self.api_key),
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<NewsApiResponse>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown status").to_string());
            return Err(Error::Upstream(format!("NewsAPI error: {}", reason)));
        }

        let body: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("NewsAPI response: {}", e)))?;
        if body.status == "error" {
            let reason = body.message.unwrap_or_else(|| "Unknown error".to_string());
            return Err(Error::Upstream(format!("NewsAPI error: {}", reason)));
        }

        let articles: Vec<RelatedArticle> = body
            .articles
            .into_iter()
            .filter_map(NewsApiArticle::into_related)
            .collect();
        debug!("NewsAPI returned {} articles for {:?}", articles.len(), query);
        Ok(articles)
    }
}

/// Search adapter for running without a news provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSearch;

#[async_trait]
impl ArticleSearch for NoopSearch {
    fn name(&self) -> &str {
        "none"
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<RelatedArticle>> {
        Ok(Vec::new())
    }
}
