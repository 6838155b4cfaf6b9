use std::sync::Arc;

use nn_core::LanguageModel;
use nn_storage::StorageManager;

pub mod bias;
pub mod decode;
pub mod keywords;
pub mod models;
pub mod narrative;
pub mod prompts;
pub mod summary;

#[derive(Debug, Clone, Default)]
pub struct InferenceConfig {
    pub model_url: Option<String>,
}

/// Settings for building a [`LanguageModel`] with [`create_model`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend: `deepseek` or `offline`.
    pub model: String,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub inference_config: InferenceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "deepseek".to_string(),
            api_key: None,
            model_name: None,
            inference_config: InferenceConfig::default(),
        }
    }
}

pub trait ModelConfig {
    fn from_config(config: &Config) -> Self;
}

/// The three analyzers sharing one model and one cache.
#[derive(Debug, Clone)]
pub struct Analyzers {
    pub bias: bias::BiasDetector,
    pub narrative: narrative::NarrativeAnalyzer,
    pub summary: summary::CrossSummaryGenerator,
}

impl Analyzers {
    pub fn new(model: Arc<dyn LanguageModel>, storage: StorageManager) -> Self {
        Self {
            bias: bias::BiasDetector::new(model.clone(), storage.clone()),
            narrative: narrative::NarrativeAnalyzer::new(model.clone(), storage.clone()),
            summary: summary::CrossSummaryGenerator::new(model, storage),
        }
    }
}

pub mod prelude {
    pub use super::bias::{bias_label, BiasDetector};
    pub use super::models::create_model;
    pub use super::narrative::{consistency_label, NarrativeAnalyzer};
    pub use super::summary::{confidence_label, CrossSummaryGenerator};
    pub use super::{Analyzers, Config, InferenceConfig};
    pub use nn_core::{Article, Error, LanguageModel, Result};
}

pub use models::create_model;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dummy::DummyModel;
    use nn_storage::MemoryStore;

    #[tokio::test]
    async fn test_analyzers_share_cache() {
        let storage = StorageManager::new(Arc::new(MemoryStore::new()));
        let reply = r#"{"biasScore": 0.25, "biasDirection": "neutral", "loadedWords": [], "overallAssessment": "Fair."}"#;
        let model = Arc::new(DummyModel::new().with_rule("media bias analyst", reply));
        let analyzers = Analyzers::new(model.clone(), storage.clone());

        let article = nn_core::Article::new("https://a.com/x", "Title", "Plain reporting.", None);
        let bias = analyzers.bias.analyze_article(&article).await;
        assert_eq!(bias.method, nn_core::AnalysisMethod::AiPowered);

        let cached: Option<nn_core::BiasAnalysis> = storage
            .get_cached_analysis(nn_storage::CacheKind::Bias, &article.url)
            .await
            .unwrap();
        assert_eq!(cached, Some(bias.clone()));

        // A second bundle over the same storage reads the cached answer.
        let other = Analyzers::new(model.clone(), storage);
        assert_eq!(other.bias.analyze_article(&article).await, bias);
        assert_eq!(model.calls(), 1);
    }
}
