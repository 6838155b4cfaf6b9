// Fakes for the collaborator traits shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nn_core::{ArticleSearch, Error, LanguageModel, RelatedArticle, Result, ScrapedPage, Scraper};
use nn_scrapers::{AnalysisPipeline, PipelineConfig};
use nn_storage::{MemoryStore, StorageManager};

/// Serves canned pages by URL; unknown URLs fail like an unreachable site.
#[derive(Default)]
pub struct StaticScraper {
    pages: HashMap<String, ScrapedPage>,
    calls: AtomicUsize,
}

impl StaticScraper {
    pub fn with_page(mut self, url: &str, title: &str, text: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            ScrapedPage {
                url: url.to_string(),
                title: title.to_string(),
                text: text.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for StaticScraper {
    async fn scrape_page(&self, url: &str) -> Result<ScrapedPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Scraping(format!("Failed to fetch {}", url)))
    }
}

/// Returns the same hits for every query.
#[derive(Default)]
pub struct StaticSearch {
    hits: Vec<RelatedArticle>,
    calls: AtomicUsize,
    limits: std::sync::Mutex<Vec<usize>>,
    queries: std::sync::Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn with_hit(mut self, url: &str, source: &str, content: &str) -> Self {
        self.hits.push(RelatedArticle {
            url: url.to_string(),
            title: format!("{} coverage", source),
            source: Some(source.to_string()),
            description: None,
            content: Some(content.to_string()),
            published_at: None,
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn limits(&self) -> Vec<usize> {
        self.limits.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ArticleSearch for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RelatedArticle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut limits) = self.limits.lock() {
            limits.push(limit);
        }
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        Ok(self.hits.clone())
    }
}

pub const ORIGINAL_URL: &str = "https://a.com/news/council";

pub const LEFT_LEANING_STORY: &str = "The city council approved a progressive budget on Monday. \
Supporters framed the plan as a step toward social justice, saying it addresses \
inequality in housing and transit. The council voted seven to two after a long debate. \
Opponents said the costs were too high for the city.";

pub const NEUTRAL_STORY: &str = "The city council approved the budget on Monday after a long debate. \
The council voted seven to two. Officials said the plan funds housing and transit \
projects over the next three years, and the mayor is expected to sign it this week.";

pub struct Harness {
    pub scraper: Arc<StaticScraper>,
    pub search: Arc<StaticSearch>,
    pub storage: StorageManager,
    pub pipeline: AnalysisPipeline,
}

pub fn harness(
    scraper: StaticScraper,
    search: StaticSearch,
    model: Arc<dyn LanguageModel>,
    config: PipelineConfig,
) -> Harness {
    let scraper = Arc::new(scraper);
    let search = Arc::new(search);
    let storage = StorageManager::new(Arc::new(MemoryStore::new()));
    let pipeline = AnalysisPipeline::new(scraper.clone(), search.clone(), model, storage.clone())
        .with_config(config);
    Harness {
        scraper,
        search,
        storage,
        pipeline,
    }
}

/// Search results covering the story from the original outlet and three others.
pub fn story_search() -> StaticSearch {
    StaticSearch::default()
        .with_hit("https://www.a.com/news/other", "A Daily", NEUTRAL_STORY)
        .with_hit("https://b.com/1", "B Times", NEUTRAL_STORY)
        .with_hit("https://c.com/1", "C Herald", NEUTRAL_STORY)
        .with_hit("https://b.com/1", "B Times", NEUTRAL_STORY)
        .with_hit("https://d.com/1", "D Post", NEUTRAL_STORY)
}
