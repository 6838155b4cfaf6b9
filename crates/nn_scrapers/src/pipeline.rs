use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use nn_core::{
    AnalysisResult, AnalysisState, Article, ArticleSearch, ContentDetection, Error,
    LanguageModel, Result, ScrapedPage, Scraper,
};
use nn_inference::bias::bias_label;
use nn_inference::keywords::truncate_chars;
use nn_inference::narrative::MIN_SOURCES;
use nn_inference::Analyzers;
use nn_storage::{CacheKind, StorageManager};
use tracing::{debug, error, info, warn};

use crate::detector::ContentDetector;
use crate::related::{find_related_articles, normalize_related};

pub const MIN_RELATED: usize = 3;
pub const MAX_RELATED: usize = 5;
const QUERY_FALLBACK_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Related articles to compare against, clamped to 3..=5.
    pub max_related: usize,
    /// Reject pages that do not look like news.
    pub require_news: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_related: MAX_RELATED,
            require_news: true,
        }
    }
}

impl PipelineConfig {
    pub fn related_limit(&self) -> usize {
        self.max_related.clamp(MIN_RELATED, MAX_RELATED)
    }
}

/// Keywords from the headline and opening, else the detected topic, else
/// the start of the content.
fn search_query(detector: &ContentDetector, article: &Article, detection: &ContentDetection) -> String {
    let keywords = detector.extract_search_keywords(&article.title, &article.content);
    if !keywords.is_empty() {
        keywords.join(" ")
    } else if !detection.main_topic.is_empty() {
        detection.main_topic.clone()
    } else {
        truncate_chars(&article.content, QUERY_FALLBACK_CHARS).to_string()
    }
}

/// Runs one page through scraping, related-coverage search, bias analysis,
/// narrative comparison and the neutral summary.
pub struct AnalysisPipeline {
    scraper: Arc<dyn Scraper>,
    search: Arc<dyn ArticleSearch>,
    analyzers: Analyzers,
    storage: StorageManager,
    detector: ContentDetector,
    config: PipelineConfig,
}

impl fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("search", &self.search.name())
            .field("config", &self.config)
            .finish()
    }
}

impl AnalysisPipeline {
    pub fn new(
        scraper: Arc<dyn Scraper>,
        search: Arc<dyn ArticleSearch>,
        model: Arc<dyn LanguageModel>,
        storage: StorageManager,
    ) -> Self {
        Self {
            scraper,
            search,
            analyzers: Analyzers::new(model, storage.clone()),
            storage,
            detector: ContentDetector::new(),
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn analyzers(&self) -> &Analyzers {
        &self.analyzers
    }

    /// Scrapes `url` and analyzes it. A result cached within the TTL is
    /// returned without scraping again.
    pub async fn run(&self, url: &str) -> Result<AnalysisResult> {
        info!("🔍 Analyzing {}", url);
        self.set_state(AnalysisState::analyzing(url)).await;

        let outcome = match self.cached_result(url).await {
            Some(result) => Ok(result),
            None => match self.scraper.scrape_page(url).await {
                Ok(page) => self.process(page.into()).await,
                Err(e) => Err(e),
            },
        };
        self.finish(url, outcome).await
    }

    pub async fn analyze_scraped(&self, page: ScrapedPage) -> Result<AnalysisResult> {
        self.analyze_article(page.into()).await
    }

    /// Analyzes an article the caller already extracted.
    pub async fn analyze_article(&self, article: Article) -> Result<AnalysisResult> {
        let url = article.url.clone();
        info!("🔍 Analyzing {}", url);
        self.set_state(AnalysisState::analyzing(url.as_str())).await;

        let outcome = self.process(article).await;
        self.finish(&url, outcome).await
    }

    async fn cached_result(&self, url: &str) -> Option<AnalysisResult> {
        match self.storage.get_cached_analysis(CacheKind::Result, url).await {
            Ok(Some(result)) => {
                debug!("Using cached analysis for {}", url);
                Some(result)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read cached analysis for {}: {}", url, e);
                None
            }
        }
    }

    async fn process(&self, article: Article) -> Result<AnalysisResult> {
        if article.content.trim().is_empty() {
            return Err(Error::NoArticles);
        }

        let detection = self.detector.detect(&article);
        if self.config.require_news && !detection.is_news {
            return Err(Error::NotNews(article.url));
        }

        let query = search_query(&self.detector, &article, &detection);
        debug!("Searching related coverage for {:?}", query);
        let related = self.related_articles(&article, &query).await;
        info!("📰 Comparing against {} related articles", related.len());

        let mut articles = Vec::with_capacity(1 + related.len());
        articles.push(article);
        articles.extend(related);

        let analyses = self.analyzers.bias.analyze_batch(&articles).await;
        let articles: Vec<Article> = articles
            .into_iter()
            .zip(analyses)
            .map(|(article, analysis)| article.with_bias(analysis))
            .collect();

        let narrative = if articles.len() >= MIN_SOURCES {
            Some(self.analyzers.narrative.compare_narratives(&articles).await?)
        } else {
            None
        };
        let summary = self
            .analyzers
            .summary
            .generate_neutral_summary(&articles, narrative.as_ref())
            .await?;

        let mut articles = articles.into_iter();
        let article = articles.next().ok_or(Error::NoArticles)?;
        let label = bias_label(article.bias_score()).to_string();
        let result = AnalysisResult {
            article,
            related_articles: articles.collect(),
            detection,
            narrative,
            summary,
            bias_label: label,
            completed_at: Utc::now(),
        };

        let url = result.article.url.as_str();
        self.storage
            .cache_analysis(CacheKind::Result, url, &result)
            .await?;
        self.storage
            .save_related_articles(url, &result.related_articles)
            .await?;
        self.storage
            .add_to_history(
                url,
                Some(result.article.title.as_str()),
                result.article.bias_score(),
                result.source_count(),
            )
            .await?;

        info!("✅ Analysis complete for {} ({} sources)", url, result.source_count());
        Ok(result)
    }

    /// Related coverage from the cache when fresh, else from the search adapter.
    async fn related_articles(&self, article: &Article, query: &str) -> Vec<Article> {
        let limit = self.config.related_limit();

        match self.storage.get_related_articles(&article.url).await {
            Ok(Some(cached)) if !cached.is_empty() => {
                debug!("Using {} cached related articles for {}", cached.len(), article.url);
                return cached
                    .into_iter()
                    .take(limit)
                    .map(|mut a| {
                        a.bias_analysis = None;
                        a
                    })
                    .collect();
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read related articles for {}: {}", article.url, e),
        }

        let hits = find_related_articles(self.search.as_ref(), query, &article.url, limit).await;
        normalize_related(hits, limit)
    }

    async fn set_state(&self, state: AnalysisState) {
        if let Err(e) = self.storage.save_state(&state).await {
            warn!("Failed to save analysis state: {}", e);
        }
    }

    async fn finish(&self, url: &str, outcome: Result<AnalysisResult>) -> Result<AnalysisResult> {
        match outcome {
            Ok(result) => {
                self.set_state(AnalysisState::complete(result.clone())).await;
                Ok(result)
            }
            Err(e) => {
                error!("Analysis of {} failed: {}", url, e);
                self.set_state(AnalysisState::failed(Some(url.to_string()), e.to_string()))
                    .await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_limit_is_clamped() {
        let limit = |max_related| {
            PipelineConfig {
                max_related,
                require_news: true,
            }
            .related_limit()
        };
        assert_eq!(limit(0), 3);
        assert_eq!(limit(4), 4);
        assert_eq!(limit(50), 5);
        assert_eq!(PipelineConfig::default().related_limit(), 5);
    }

    #[test]
    fn test_search_query_prefers_keywords() {
        let detector = ContentDetector::new();
        let article = Article::new(
            "https://a.com/x",
            "Senate passes climate bill",
            "Lawmakers said the climate bill was historic.",
            None,
        );
        let detection = detector.detect(&article);
        assert_eq!(
            search_query(&detector, &article, &detection),
            "climate bill senate passes lawmakers"
        );

        let stop_words = Article::new("https://a.com/y", "The and of", "it is what it is", None);
        let detection = detector.detect(&stop_words);
        assert_eq!(
            search_query(&detector, &stop_words, &detection),
            "The and of it is what it is"
        );
    }
}
