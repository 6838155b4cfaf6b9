pub mod detector;
pub mod pipeline;
pub mod related;
pub mod scrapers;
pub mod search;

pub use detector::ContentDetector;
pub use pipeline::{AnalysisPipeline, PipelineConfig};
pub use related::{extract_domain, find_related_articles, normalize_related};
pub use scrapers::{extract_page, HtmlScraper};
pub use search::{NewsApiSearch, NoopSearch};

pub mod prelude {
    pub use super::{AnalysisPipeline, ContentDetector, HtmlScraper, PipelineConfig};
    pub use super::{NewsApiSearch, NoopSearch};
    pub use nn_core::{Article, ArticleSearch, Error, Result, Scraper};
}
