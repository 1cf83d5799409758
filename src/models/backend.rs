//! Model backend trait

use async_trait::async_trait;
use image::DynamicImage;

use super::types::ModelError;

/// Batch recognition model
///
/// Implementations are loaded once and then shared read-only across all
/// in-flight requests, so they must be `Send + Sync`.
#[async_trait]
pub trait RecognitionModel: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Verify the backend is usable. Called once during startup load.
    async fn verify_reachable(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Recognize each image with its paired instruction.
    ///
    /// `images` and `instructions` have equal length; the result holds one
    /// string per image, in the same order.
    async fn batch_inference(
        &self,
        images: &[DynamicImage],
        instructions: &[String],
    ) -> Result<Vec<String>, ModelError>;
}
