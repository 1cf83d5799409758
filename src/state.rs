//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::models::ModelManager;
use crate::ocr::RecognitionPipeline;

/// Shared application state
///
/// Cloned into every handler; the inner values are never replaced.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    models: ModelManager,
    pipeline: RecognitionPipeline,
}

impl AppState {
    /// Create state with an unloaded model manager bound to the configured file
    pub fn new(config: &Config) -> Self {
        let models = ModelManager::new(&config.model.config_path);
        let pipeline = RecognitionPipeline::new(&config.recognition);
        Self::from_parts(models, pipeline)
    }

    /// Create state from explicit parts
    pub fn from_parts(models: ModelManager, pipeline: RecognitionPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { models, pipeline }),
        }
    }

    /// Get the model manager
    pub fn models(&self) -> &ModelManager {
        &self.inner.models
    }

    /// Get the recognition pipeline
    pub fn pipeline(&self) -> &RecognitionPipeline {
        &self.inner.pipeline
    }
}
