use std::sync::Arc;

use nn_core::{Error, LanguageModel, Result};

use crate::{Config, ModelConfig};

pub mod deepseek;
pub mod dummy;

pub use deepseek::{DeepSeekConfig, DeepSeekModel};
pub use dummy::DummyModel;

/// Builds the configured model. `offline` yields a model that always fails,
/// so every analysis takes its heuristic path.
pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn LanguageModel>> {
    let config = config.unwrap_or_default();

    match config.model.as_str() {
        "deepseek" => {
            let model = DeepSeekModel::with_config(
                DeepSeekConfig::from_config(&config),
                config.api_key.clone(),
            )?;
            if model.has_api_key() {
                tracing::info!("🧠 Using DeepSeek model {}", model.model_name());
            } else {
                tracing::warn!("⚠️ No DeepSeek API key configured, analyses will use keyword fallbacks");
            }
            Ok(Arc::new(model))
        }
        "offline" => {
            tracing::info!("🧠 Running offline, analyses will use keyword fallbacks");
            Ok(Arc::new(DummyModel::unavailable()))
        }
        other => Err(Error::Config(format!(
            "Unknown model: {} (available: deepseek, offline)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_offline_model() {
        let config = Config {
            model: "offline".to_string(),
            ..Config::default()
        };
        let model = create_model(Some(config)).await.unwrap();
        assert_eq!(model.name(), "Offline");
        assert!(model.send_prompt("Hello", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_create_deepseek_without_key() {
        let model = create_model(None).await.unwrap();
        assert_eq!(model.name(), "DeepSeek");
        let err = model.send_prompt("Hello", 10).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let config = Config {
            model: "ollama".to_string(),
            ..Config::default()
        };
        assert!(matches!(create_model(Some(config)).await, Err(Error::Config(_))));
    }
}
