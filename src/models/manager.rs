//! Model Manager
//!
//! Owns the loaded recognition models. The model map is published exactly
//! once; after that the manager is ready for the rest of the process
//! lifetime and the models are only ever read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use super::backend::RecognitionModel;
use super::echo::EchoModel;
use super::settings::{BackendKind, ModelSettings};
use super::types::ModelError;
use super::vision::VisionHttpModel;

/// Model kind used by the recognition pipeline
pub const OCR_MODEL: &str = "ocr";

/// Kinds that must be present before the manager reports ready
pub const REQUIRED_MODELS: &[&str] = &[OCR_MODEL];

type ModelMap = HashMap<String, Arc<dyn RecognitionModel>>;

pub struct ModelManager {
    config_path: PathBuf,
    models: OnceLock<ModelMap>,
}

impl ModelManager {
    /// Create an unloaded manager bound to a model configuration file
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            models: OnceLock::new(),
        }
    }

    /// Create a manager that is ready at construction
    pub fn preloaded(models: ModelMap) -> Result<Self, ModelError> {
        check_required(&models)?;
        Ok(Self::ready_with(models))
    }

    /// Convenience for a single OCR model
    pub fn with_ocr_model(model: Arc<dyn RecognitionModel>) -> Self {
        let mut models: ModelMap = HashMap::new();
        models.insert(OCR_MODEL.to_string(), model);
        Self::ready_with(models)
    }

    fn ready_with(models: ModelMap) -> Self {
        Self {
            config_path: PathBuf::new(),
            models: OnceLock::from(models),
        }
    }

    /// Load all required models
    ///
    /// On failure the manager stays not ready and the error is returned to
    /// the caller, which is expected to abort startup.
    pub async fn load(&self) -> Result<(), ModelError> {
        if self.is_ready() {
            tracing::warn!("Models already loaded, ignoring reload request");
            return Ok(());
        }

        tracing::info!("Loading models from {}", self.config_path.display());

        let settings = ModelSettings::from_yaml_file(&self.config_path)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load models: {}", e);
                e
            })?;

        let ocr = build_model(&settings)?;
        if let Err(e) = ocr.verify_reachable().await {
            tracing::error!("Failed to load models: {}", e);
            return Err(e);
        }

        let mut models: ModelMap = HashMap::new();
        models.insert(OCR_MODEL.to_string(), ocr);
        check_required(&models)?;

        if self.models.set(models).is_err() {
            // A concurrent load won the race; its models stay in place
            tracing::warn!("Models were loaded concurrently, keeping the first set");
        }

        tracing::info!("All models loaded successfully");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.models.get().is_some()
    }

    /// Get a loaded model by kind
    pub fn get(&self, kind: &str) -> Result<Arc<dyn RecognitionModel>, ModelError> {
        let models = self.models.get().ok_or(ModelError::NotReady)?;
        models.get(kind).cloned().ok_or_else(|| {
            tracing::error!("Model kind '{}' requested but never loaded", kind);
            ModelError::UnknownKind(kind.to_string())
        })
    }
}

fn build_model(settings: &ModelSettings) -> Result<Arc<dyn RecognitionModel>, ModelError> {
    let chat = &settings.chat_config;
    let model: Arc<dyn RecognitionModel> = match chat.backend {
        BackendKind::Http => Arc::new(VisionHttpModel::new(chat)?),
        BackendKind::Echo => Arc::new(EchoModel),
    };
    tracing::info!("Using {:?} backend ({})", chat.backend, model.name());
    Ok(model)
}

fn check_required(models: &ModelMap) -> Result<(), ModelError> {
    for kind in REQUIRED_MODELS {
        if !models.contains_key(*kind) {
            return Err(ModelError::Load(format!("Required model '{}' missing", kind)));
        }
    }
    Ok(())
}
