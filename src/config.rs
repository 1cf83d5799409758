//! Configuration management for the OCR Parse Server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub recognition: RecognitionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the model configuration file, read once at startup
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionConfig {
    /// Maximum number of batch inference calls in flight
    pub max_concurrent_inference: usize,
    pub inference_timeout_secs: u64,
    pub render_timeout_secs: u64,
    /// Resolution used when rasterizing PDF pages
    pub pdf_render_dpi: u32,
    /// Pause before releasing page images after inference
    pub cleanup_delay_ms: u64,
    /// Directory for `{stem}_{task}_result.md` files. Disabled when unset.
    pub output_dir: Option<PathBuf>,
    /// Reject unknown task names instead of falling back to `text`
    pub strict_tasks: bool,
}

impl RecognitionConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_millis(self.cleanup_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            model: ModelConfig {
                config_path: PathBuf::from("model_configs.yaml"),
            },
            recognition: RecognitionConfig::default(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        RecognitionConfig {
            max_concurrent_inference: 1,
            inference_timeout_secs: 300,
            render_timeout_secs: 120,
            pdf_render_dpi: 200,
            cleanup_delay_ms: 500,
            output_dir: None,
            strict_tasks: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let rec = defaults.recognition;

        let max_concurrent_inference = parse_var(&lookup, "MAX_CONCURRENT_INFERENCE", rec.max_concurrent_inference)?;
        if max_concurrent_inference == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_CONCURRENT_INFERENCE",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "SERVER_PORT", defaults.server.port)?,
            },
            model: ModelConfig {
                config_path: lookup("MODEL_CONFIG_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.model.config_path),
            },
            recognition: RecognitionConfig {
                max_concurrent_inference,
                inference_timeout_secs: parse_var(&lookup, "INFERENCE_TIMEOUT_SECS", rec.inference_timeout_secs)?,
                render_timeout_secs: parse_var(&lookup, "RENDER_TIMEOUT_SECS", rec.render_timeout_secs)?,
                pdf_render_dpi: parse_var(&lookup, "PDF_RENDER_DPI", rec.pdf_render_dpi)?,
                cleanup_delay_ms: parse_var(&lookup, "CLEANUP_DELAY_MS", rec.cleanup_delay_ms)?,
                output_dir: lookup("RESULT_OUTPUT_DIR")
                    .filter(|dir| !dir.trim().is_empty())
                    .map(PathBuf::from),
                strict_tasks: parse_var(&lookup, "STRICT_TASKS", rec.strict_tasks)?,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
