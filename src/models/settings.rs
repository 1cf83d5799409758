//! Model configuration file
//!
//! The model configuration is a YAML document read once at startup.
//! Only the `chat_config` section is consumed; other sections are ignored
//! so the same file can carry settings for other tooling.
//!
//! ```yaml
//! chat_config:
//!   backend: http
//!   url: http://localhost:11434
//!   model: llava
//!   batch_size: 4
//!   request_timeout_secs: 120
//! ```

use std::path::Path;

use serde::Deserialize;

use super::types::ModelError;

/// Recognition backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Ollama-compatible vision LLM over HTTP
    Http,
    /// Returns each instruction unchanged
    Echo,
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Http
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    #[serde(default)]
    pub chat_config: ChatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum concurrent requests issued for one batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llava".to_string()
}

fn default_batch_size() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            url: default_url(),
            model: default_model(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ModelSettings {
    /// Parse settings from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self, ModelError> {
        let settings: ModelSettings = serde_yaml::from_str(contents)
            .map_err(|e| ModelError::Config(format!("Failed to parse YAML: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ModelError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.chat_config.batch_size == 0 {
            return Err(ModelError::Config("chat_config.batch_size must be at least 1".into()));
        }
        if self.chat_config.backend == BackendKind::Http && self.chat_config.url.trim().is_empty() {
            return Err(ModelError::Config("chat_config.url is required for the http backend".into()));
        }
        Ok(())
    }
}
