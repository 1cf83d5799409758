//! Recognition Models
//!
//! The OCR model is an external collaborator reached through the
//! [`RecognitionModel`] trait. Backends are selected by the model
//! configuration file and loaded once at startup by the [`ModelManager`].
//!
//! Supports these backends:
//! - `http`: Ollama-compatible vision LLM endpoint
//! - `echo`: answers every image with its instruction (smoke runs)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_parse_server::models::{ModelManager, OCR_MODEL};
//!
//! let manager = ModelManager::new("model_configs.yaml");
//! manager.load().await?;
//!
//! let model = manager.get(OCR_MODEL)?;
//! let texts = model.batch_inference(&images, &instructions).await?;
//! ```

mod backend;
mod echo;
mod manager;
mod settings;
mod types;
mod vision;

pub use backend::RecognitionModel;
pub use echo::EchoModel;
pub use manager::{ModelManager, OCR_MODEL, REQUIRED_MODELS};
pub use settings::{BackendKind, ChatConfig, ModelSettings};
pub use types::ModelError;
pub use vision::VisionHttpModel;
