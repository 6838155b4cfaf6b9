pub mod error;
pub mod models;
pub mod sources;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::{parse_json_response, strip_code_fences, LanguageModel, JSON_INSTRUCTION};
pub use sources::{ArticleSearch, Scraper};
pub use storage::KeyValueStore;
pub use types::*;
