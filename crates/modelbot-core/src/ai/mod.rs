pub mod claude;
pub mod endpoint;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;

use crate::error::RemoteError;

pub use claude::ClaudeClient;
pub use endpoint::EndpointClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

/// A chat-completion collaborator: one message in, one reply out.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, RemoteError>;
}

/// Read the body of a non-success response into an error.
pub(crate) async fn status_error(provider: &'static str, response: reqwest::Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    RemoteError::Status {
        provider,
        status,
        body,
    }
}
