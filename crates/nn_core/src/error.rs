use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required credential or setting is missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote model answered with a non-success status or could not be reached.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The remote model answered with something that is not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("At least {required} sources are required for comparison, got {found}")]
    InsufficientSources { required: usize, found: usize },

    #[error("No articles available to summarize")]
    NoArticles,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Page does not look like a news article: {0}")]
    NotNews(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Errors raised by the LLM client. Analyzers answer these with a
    /// heuristic result instead of surfacing them.
    pub fn is_model_failure(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Upstream(_) | Error::Parse(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upstream(e.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
