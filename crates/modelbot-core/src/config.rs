use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::ai::ollama::DEFAULT_OLLAMA_URL;
use crate::provider::Provider;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub ollama_url: Option<String>,
    pub claude_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Ollama.as_str().to_string()),
            default_model: None,
            endpoint_url: None,
            ollama_url: None,
            claude_api_key: None,
            openai_api_key: None,
        }
    }

    /// Load from the user config directory, falling back to defaults when
    /// no file exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Overlay API keys and the endpoint from the environment. `lookup` is
    /// `std::env::var` in the binary.
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.claude_api_key = Some(key);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(url) = lookup("MODELBOT_ENDPOINT") {
            self.endpoint_url = Some(url);
        }
        self
    }

    pub fn provider(&self) -> Result<Provider> {
        match &self.provider {
            Some(name) => name.parse(),
            None => Ok(Provider::Ollama),
        }
    }

    /// Configured model, or the provider's default.
    pub fn model(&self) -> String {
        match &self.default_model {
            Some(model) => model.clone(),
            None => self
                .provider()
                .unwrap_or(Provider::Ollama)
                .default_model()
                .to_string(),
        }
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("modelbot"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.provider().unwrap(), Provider::Ollama);
        assert_eq!(config.ollama_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            provider: Some("endpoint".to_string()),
            endpoint_url: Some("http://localhost:8080/chat".to_string()),
            default_model: Some("house-model".to_string()),
            ..Config::new()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.model(), "house-model");
    }

    #[test]
    fn test_older_file_without_new_fields_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"provider":"claude","default_model":null,"claude_api_key":"k","openai_api_key":null}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.provider().unwrap(), Provider::Claude);
        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.model(), Provider::Claude.default_model());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = Config {
            claude_api_key: Some("from-file".to_string()),
            ..Config::new()
        }
        .with_env_from(|name| match name {
            "ANTHROPIC_API_KEY" => Some("from-env".to_string()),
            "MODELBOT_ENDPOINT" => Some("http://example.test/chat".to_string()),
            _ => None,
        });

        assert_eq!(config.claude_api_key.as_deref(), Some("from-env"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://example.test/chat"));
        assert_eq!(config.openai_api_key, None);
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let config = Config {
            provider: Some("carrier-pigeon".to_string()),
            ..Config::new()
        };
        assert!(config.provider().is_err());
    }
}
