use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{status_error, Completion};
use crate::error::RemoteError;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn default_model() -> &'static str {
        "claude-sonnet-4-20250514"
    }
}

#[async_trait]
impl Completion for ClaudeClient {
    async fn complete(&self, message: &str) -> Result<String, RemoteError> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens: 4096,
            messages: vec![ClaudeMessage {
                role: "user",
                content: message,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error("Claude", response).await);
        }

        let claude_response: ClaudeResponse = response.json().await?;
        Ok(claude_response
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default())
    }
}
