use async_trait::async_trait;
use policyqa_core::{LLMProvider, LLMResponse};
use reqwest::Client;
use serde_json::json;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
const MAX_NEW_TOKENS: u32 = 1024;

/// Hugging Face Inference API client for text-generation models.
#[derive(Clone)]
pub struct HuggingFaceProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HuggingFaceProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        info!("Creating HuggingFaceProvider");
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

/// Text-generation responses come as `[{"generated_text": ..}]`, some models
/// answer with a bare object, and failures carry an `error` field.
fn parse_response(response: &serde_json::Value) -> anyhow::Result<LLMResponse> {
    if let Some(error) = response["error"].as_str() {
        anyhow::bail!("Hugging Face error: {error}");
    }

    let generated = if response.is_array() {
        &response[0]["generated_text"]
    } else {
        &response["generated_text"]
    };
    let content = generated
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing generated_text"))?
        .trim()
        .to_string();

    Ok(LLMResponse {
        content,
        usage: None,
    })
}

#[async_trait]
impl LLMProvider for HuggingFaceProvider {
    async fn generate(&self, prompt: &str, model: &str) -> anyhow::Result<LLMResponse> {
        let request = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": MAX_NEW_TOKENS,
                "return_full_text": false,
            },
        });

        info!("Sending request to Hugging Face: model={model}");

        let response = self
            .client
            .post(format!("{}/models/{model}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let parsed = parse_response(&response)?;
        info!("Received response from Hugging Face");
        Ok(parsed)
    }

    fn get_default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }
}
