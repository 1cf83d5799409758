//! Vision LLM backend
//!
//! Sends each page image to an Ollama-compatible `/api/generate` endpoint
//! with the task instruction as the prompt.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use futures::{stream, StreamExt, TryStreamExt};
use image::DynamicImage;

use super::backend::RecognitionModel;
use super::settings::ChatConfig;
use super::types::ModelError;

/// Ollama-compatible vision model
pub struct VisionHttpModel {
    client: reqwest::Client,
    /// API base URL
    base_url: String,
    /// Model name (e.g., "llava", "qwen2.5vl")
    model: String,
    /// Requests in flight per batch
    batch_size: usize,
}

impl VisionHttpModel {
    pub fn new(config: &ChatConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ModelError::Load(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
        })
    }

    async fn recognize_one(&self, image: &DynamicImage, instruction: &str) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.base_url);
        let image_base64 = encode_png_base64(image)?;

        let request = serde_json::json!({
            "model": self.model,
            "prompt": instruction,
            "images": [image_base64],
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::ApiError(format!("Failed to call {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::ApiError(format!(
                "Model endpoint returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ModelError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = result["response"]
            .as_str()
            .ok_or_else(|| ModelError::ApiError("Response is missing the `response` field".into()))?;

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl RecognitionModel for VisionHttpModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn verify_reachable(&self) -> Result<(), ModelError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ModelError::Load(format!("Model endpoint {} unreachable: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ModelError::Load(format!(
                "Model endpoint {} returned {}",
                url,
                response.status()
            )));
        }
        Ok(())
    }

    async fn batch_inference(
        &self,
        images: &[DynamicImage],
        instructions: &[String],
    ) -> Result<Vec<String>, ModelError> {
        if images.len() != instructions.len() {
            return Err(ModelError::Inference(format!(
                "{} images but {} instructions",
                images.len(),
                instructions.len()
            )));
        }

        // `buffered` keeps output order equal to input order
        let requests: Vec<_> = images
            .iter()
            .zip(instructions.iter())
            .map(|(image, instruction)| self.recognize_one(image, instruction))
            .collect();
        stream::iter(requests)
            .buffered(self.batch_size)
            .try_collect()
            .await
    }
}

fn encode_png_base64(image: &DynamicImage) -> Result<String, ModelError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| ModelError::Inference(format!("Failed to encode image: {}", e)))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buffer))
}
