//! Echo backend for smoke runs.
//!
//! Answers every image with the instruction it was paired with, so the
//! server can be exercised end to end without a model endpoint.

use async_trait::async_trait;
use image::DynamicImage;

use super::backend::RecognitionModel;
use super::types::ModelError;

#[derive(Debug, Default)]
pub struct EchoModel;

#[async_trait]
impl RecognitionModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
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
        Ok(instructions.to_vec())
    }
}
