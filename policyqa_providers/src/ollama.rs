use async_trait::async_trait;
use policyqa_core::{LLMProvider, LLMResponse, Usage};
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::token_count;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama2";

/// Client for a local Ollama server (`/api/generate`, non-streaming).
#[derive(Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    #[must_use]
    pub fn new() -> Self {
        info!("Creating OllamaProvider");
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_response(response: &serde_json::Value) -> anyhow::Result<LLMResponse> {
    if let Some(error) = response["error"].as_str() {
        anyhow::bail!("Ollama error: {error}");
    }

    let content = response["response"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing response"))?
        .to_string();

    let prompt_tokens = token_count(&response["prompt_eval_count"]);
    let completion_tokens = token_count(&response["eval_count"]);
    let usage = (prompt_tokens > 0 || completion_tokens > 0).then(|| Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens.saturating_add(completion_tokens),
    });

    Ok(LLMResponse { content, usage })
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn generate(&self, prompt: &str, model: &str) -> anyhow::Result<LLMResponse> {
        let request = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
        });

        info!("Sending request to Ollama: model={model}");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    anyhow::anyhow!(
                        "Cannot connect to Ollama at {}. Make sure it is running: ollama run {model}",
                        self.base_url
                    )
                } else {
                    e.into()
                }
            })?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let parsed = parse_response(&response)?;
        info!("Received response from Ollama");
        Ok(parsed)
    }

    fn get_default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_response_and_eval_counts() {
        let body = json!({
            "model": "llama2",
            "response": "You get 20 days.",
            "done": true,
            "prompt_eval_count": 40,
            "eval_count": 6
        });
        let parsed = parse_response(&body).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(parsed.content, "You get 20 days.");
        assert_eq!(parsed.usage.map(|u| u.total_tokens), Some(46));
    }

    #[test]
    fn usage_is_absent_without_counts() {
        let parsed =
            parse_response(&json!({ "response": "ok" })).unwrap_or_else(|e| panic!("{e}"));
        assert!(parsed.usage.is_none());
    }

    #[test]
    fn error_field_is_reported() {
        let err = parse_response(&json!({ "error": "model 'llama9' not found" }))
            .err()
            .map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Ollama error: model 'llama9' not found"));
    }
}
