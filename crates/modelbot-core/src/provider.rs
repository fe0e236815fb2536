use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::ai::{ClaudeClient, Completion, EndpointClient, OllamaClient, OpenAIClient};
use crate::config::Config;
use crate::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Endpoint,
    Ollama,
    Claude,
    OpenAI,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Endpoint => "endpoint",
            Provider::Ollama => "ollama",
            Provider::Claude => "claude",
            Provider::OpenAI => "openai",
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![
            Provider::Endpoint,
            Provider::Ollama,
            Provider::Claude,
            Provider::OpenAI,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Endpoint => "Chat Endpoint",
            Provider::Ollama => "Ollama (Local)",
            Provider::Claude => "Claude (Anthropic)",
            Provider::OpenAI => "ChatGPT (OpenAI)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Endpoint => "server default",
            Provider::Ollama => OllamaClient::default_model(),
            Provider::Claude => ClaudeClient::default_model(),
            Provider::OpenAI => OpenAIClient::default_model(),
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "endpoint" => Ok(Provider::Endpoint),
            "ollama" => Ok(Provider::Ollama),
            "claude" => Ok(Provider::Claude),
            "openai" => Ok(Provider::OpenAI),
            other => Err(anyhow!(
                "unknown provider '{}', expected one of: endpoint, ollama, claude, openai",
                other
            )),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stand-in for a provider whose API key is missing. Every call fails, so
/// the session shows its usual error entry instead of refusing to start.
struct Unconfigured(&'static str);

#[async_trait::async_trait]
impl Completion for Unconfigured {
    async fn complete(&self, _message: &str) -> Result<String, RemoteError> {
        Err(RemoteError::MissingKey(self.0))
    }
}

/// Build the collaborator selected by `config`.
pub fn build_backend(config: &Config) -> Result<Arc<dyn Completion>> {
    let provider = config.provider()?;
    let model = config.model();

    let backend: Arc<dyn Completion> = match provider {
        Provider::Endpoint => {
            let url = config
                .endpoint_url
                .as_deref()
                .ok_or_else(|| anyhow!("endpoint provider selected but no endpoint_url is set"))?;
            Arc::new(EndpointClient::new(url))
        }
        Provider::Ollama => Arc::new(OllamaClient::new(config.ollama_url(), &model)),
        Provider::Claude => match config.claude_api_key.as_deref() {
            Some(key) => Arc::new(ClaudeClient::new(key, &model)),
            None => Arc::new(Unconfigured("Claude")),
        },
        Provider::OpenAI => match config.openai_api_key.as_deref() {
            Some(key) => Arc::new(OpenAIClient::new(key, &model)),
            None => Arc::new(Unconfigured("OpenAI")),
        },
    };
    Ok(backend)
}
