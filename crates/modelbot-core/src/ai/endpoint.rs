use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{status_error, Completion};
use crate::error::RemoteError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointRequest<'a> {
    user_message: &'a str,
}

/// The endpoint may answer with a bare JSON string or wrap it.
#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointResponse {
    Text(Option<String>),
    Wrapped { response: Option<String> },
}

/// Server-side chat endpoint that takes `{"userMessage": ...}` and answers
/// with the completion text.
#[derive(Clone)]
pub struct EndpointClient {
    client: Client,
    url: String,
}

impl EndpointClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Completion for EndpointClient {
    async fn complete(&self, message: &str) -> Result<String, RemoteError> {
        let response = self
            .client
            .post(&self.url)
            .json(&EndpointRequest {
                user_message: message,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error("Endpoint", response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            debug!("endpoint returned an empty body");
            return Ok(String::new());
        }

        let text = match serde_json::from_str(&body)? {
            EndpointResponse::Text(text) => text,
            EndpointResponse::Wrapped { response } => response,
        };
        Ok(text.unwrap_or_default())
    }
}
