use async_trait::async_trait;

use crate::types::{RelatedArticle, ScrapedPage};
use crate::Result;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Fetches a page and extracts its title and main text.
    async fn scrape_page(&self, url: &str) -> Result<ScrapedPage>;
}

#[async_trait]
pub trait ArticleSearch: Send + Sync {
    fn name(&self) -> &str;

    /// Searches for coverage matching `query`, returning at most `limit` hits.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RelatedArticle>>;
}
