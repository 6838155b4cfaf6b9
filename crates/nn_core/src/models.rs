use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Error, Result};

/// Appended to every prompt whose answer must be machine readable.
pub const JSON_INSTRUCTION: &str =
    "IMPORTANT: Respond ONLY with valid JSON. No markdown, no explanation, just pure JSON.";

#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Sends a single user prompt and returns the raw completion text.
    async fn send_prompt(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Sends a prompt that demands a pure JSON answer and parses it.
    async fn send_prompt_json(&self, prompt: &str, max_tokens: u32) -> Result<Value> {
        let prompt = format!("{}\n\n{}", prompt, JSON_INSTRUCTION);
        let response = self.send_prompt(&prompt, max_tokens).await?;
        parse_json_response(&response)
    }
}

/// Removes Markdown code fences the model sometimes wraps around JSON.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn parse_json_response(text: &str) -> Result<Value> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).map_err(|e| {
        tracing::debug!(response = %text, "model response is not valid JSON");
        Error::Parse(format!("model did not return valid JSON: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EchoModel(String);

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn send_prompt(&self, prompt: &str, _max_tokens: u32) -> Result<String> {
            assert!(prompt.ends_with(JSON_INSTRUCTION));
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_json_response_rejects_prose() {
        let err = parse_json_response("Sure! Here is the analysis.").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn test_send_prompt_json_parses_fenced_reply() {
        let model = EchoModel("```json\n{\"biasScore\": 0.4}\n```".to_string());
        let value = model.send_prompt_json("Analyze", 100).await.unwrap();
        assert_eq!(value["biasScore"], 0.4);
    }
}
