use async_trait::async_trait;
use policyqa_core::{LLMProvider, LLMResponse, Usage};
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::token_count;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Pull the answer text and token usage out of a `generateContent` response.
fn parse_response(response: &serde_json::Value) -> anyhow::Result<LLMResponse> {
    if let Some(reason) = response["promptFeedback"]["blockReason"].as_str() {
        anyhow::bail!("Prompt blocked by Gemini: {reason}");
    }

    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content parts"))?;

    let content: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();

    let usage = response["usageMetadata"].as_object().map(|u| Usage {
        prompt_tokens: token_count(&u["promptTokenCount"]),
        completion_tokens: token_count(&u["candidatesTokenCount"]),
        total_tokens: token_count(&u["totalTokenCount"]),
    });

    Ok(LLMResponse { content, usage })
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, prompt: &str, model: &str) -> anyhow::Result<LLMResponse> {
        let request = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        info!("Sending request to Gemini API: model={model}");

        let response = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let parsed = parse_response(&response)?;
        info!("Received response from Gemini API");
        Ok(parsed)
    }

    fn get_default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }
}
