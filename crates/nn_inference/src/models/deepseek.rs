use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nn_core::{Error, LanguageModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Config, ModelConfig};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    base_url: String,
    model_name: String,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ModelConfig for DeepSeekConfig {
    fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            base_url: config
                .inference_config
                .model_url
                .clone()
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model_name: config.model_name.clone().unwrap_or(defaults.model_name),
        }
    }
}

/// Client for DeepSeek's OpenAI-compatible chat completions endpoint.
pub struct DeepSeekModel {
    client: Arc<Client>,
    api_key: Option<String>,
    config: DeepSeekConfig,
}

impl DeepSeekModel {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_config(DeepSeekConfig::default(), api_key)
    }

    pub fn with_config(config: DeepSeekConfig, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: Arc::new(Client::new()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            config,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    /// Sends a tiny prompt; any failure means the key is unusable.
    pub async fn validate_api_key(&self) -> bool {
        match self.send_prompt("Hello", 10).await {
            Ok(_) => true,
            Err(e) => {
                tracing::info!("API key validation failed: {}", e);
                false
            }
        }
    }
}

impl fmt::Debug for DeepSeekModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.config.base_url)
            .field("model_name", &self.config.model_name)
            .finish()
    }
}

#[async_trait]
impl LanguageModel for DeepSeekModel {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn send_prompt(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("DeepSeek API key is required".to_string()))?;

        let request = ChatRequest {
            model: &self.config.model_name,
            max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                });
            tracing::error!("DeepSeek API call failed with {}: {}", status, message);
            return Err(Error::Upstream(format!("DeepSeek API Error: {}", message)));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Upstream("DeepSeek returned no choices".to_string()))
    }
}
