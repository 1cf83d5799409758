//! Recognition Pipeline
//!
//! Turns a file path and a task name into recognized text. The model is
//! called once per request with every page of the input.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::RecognitionConfig;
use crate::models::RecognitionModel;
use crate::pdf::{MupdfRasterizer, PageRasterizer};

use super::input::InputKind;
use super::sink::ResultSink;
use super::task::Task;
use super::types::{RecognitionError, RecognitionOutput};

/// Separator placed between consecutive page results
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Recognition pipeline shared by all requests
pub struct RecognitionPipeline {
    rasterizer: Arc<dyn PageRasterizer>,
    /// Bounds concurrent batch inference calls
    inference_permits: Arc<Semaphore>,
    inference_timeout: Duration,
    render_timeout: Duration,
    /// Best-effort settle time before page images are released
    cleanup_delay: Duration,
    strict_tasks: bool,
    sink: ResultSink,
}

impl RecognitionPipeline {
    /// Create a pipeline that rasterizes PDFs with MuPDF
    pub fn new(config: &RecognitionConfig) -> Self {
        Self::with_rasterizer(config, Arc::new(MupdfRasterizer::new(config.pdf_render_dpi)))
    }

    /// Create a pipeline with a custom PDF rasterizer
    pub fn with_rasterizer(config: &RecognitionConfig, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            rasterizer,
            inference_permits: Arc::new(Semaphore::new(config.max_concurrent_inference.max(1))),
            inference_timeout: config.inference_timeout(),
            render_timeout: config.render_timeout(),
            cleanup_delay: config.cleanup_delay(),
            strict_tasks: config.strict_tasks,
            sink: ResultSink::from_option(config.output_dir.clone()),
        }
    }

    /// Run single-task recognition on a PDF or image file
    #[tracing::instrument(level = "debug", skip(self, model), fields(model = model.name()))]
    pub async fn recognize(
        &self,
        path: &Path,
        model: &dyn RecognitionModel,
        task: &str,
    ) -> Result<RecognitionOutput, RecognitionError> {
        tracing::info!("Starting single task recognition: {}", task);
        tracing::info!("Processing file: {}", path.display());

        let is_file = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(RecognitionError::NotFound(path.to_path_buf()));
        }

        let task = self.resolve_task(task)?;
        let instruction = task.instruction();

        let kind = InputKind::from_path(path)?;
        let images = self.materialize(path, kind).await?;

        tracing::info!("Performing {} recognition on {} image(s)...", task, images.len());
        let start = Instant::now();

        let instructions = vec![instruction.to_string(); images.len()];
        let responses = self.run_inference(model, &images, &instructions).await?;

        tracing::info!("Recognition time: {:.2}s", start.elapsed().as_secs_f64());

        let text = responses.join(PAGE_SEPARATOR);
        let page_count = images.len();

        self.sink.write(path, task, &text).await?;

        tracing::info!("Single task recognition completed: task={}, images={}", task, page_count);

        release_images(images, self.cleanup_delay).await;

        Ok(RecognitionOutput { text, page_count })
    }

    fn resolve_task(&self, name: &str) -> Result<Task, RecognitionError> {
        if self.strict_tasks {
            Task::from_name(name).ok_or_else(|| RecognitionError::InvalidTask(name.to_string()))
        } else {
            Ok(Task::resolve(name))
        }
    }

    /// Load the input as an ordered list of page images
    async fn materialize(&self, path: &Path, kind: InputKind) -> Result<Vec<DynamicImage>, RecognitionError> {
        match kind {
            InputKind::Pdf => self.rasterize_pdf(path.to_path_buf()).await,
            InputKind::Image => load_image(path.to_path_buf()).await.map(|image| vec![image]),
        }
    }

    async fn rasterize_pdf(&self, path: PathBuf) -> Result<Vec<DynamicImage>, RecognitionError> {
        tracing::warn!("PDF input detected, converting all pages to images for processing");

        let rasterizer = self.rasterizer.clone();
        let result = timeout(
            self.render_timeout,
            tokio::task::spawn_blocking(move || rasterizer.rasterize(&path)),
        )
        .await;

        let images = match result {
            Err(_) => {
                return Err(RecognitionError::Timeout {
                    stage: "PDF rendering",
                    secs: self.render_timeout.as_secs(),
                })
            }
            Ok(Err(join_err)) => return Err(RecognitionError::Conversion(format!("Task join error: {}", join_err))),
            Ok(Ok(Err(e))) => return Err(RecognitionError::Conversion(e.to_string())),
            Ok(Ok(Ok(images))) => images,
        };

        if images.is_empty() {
            return Err(RecognitionError::Conversion("PDF has no pages".to_string()));
        }

        tracing::info!("Converted {} pages to images", images.len());
        Ok(images)
    }

    async fn run_inference(
        &self,
        model: &dyn RecognitionModel,
        images: &[DynamicImage],
        instructions: &[String],
    ) -> Result<Vec<String>, RecognitionError> {
        let _permit = self
            .inference_permits
            .acquire()
            .await
            .map_err(|e| RecognitionError::Failed(format!("Could not acquire inference permit: {}", e)))?;

        let responses = timeout(self.inference_timeout, model.batch_inference(images, instructions))
            .await
            .map_err(|_| RecognitionError::Timeout {
                stage: "inference",
                secs: self.inference_timeout.as_secs(),
            })?
            .map_err(|e| RecognitionError::Inference(e.to_string()))?;

        if responses.len() != images.len() {
            return Err(RecognitionError::Inference(format!(
                "Model returned {} results for {} images",
                responses.len(),
                images.len()
            )));
        }

        Ok(responses)
    }
}

async fn load_image(path: PathBuf) -> Result<DynamicImage, RecognitionError> {
    tokio::task::spawn_blocking(move || image::open(&path))
        .await
        .map_err(|e| RecognitionError::Failed(format!("Task join error: {}", e)))?
        .map_err(|e| RecognitionError::Failed(e.to_string()))
}

/// Release page images after a short settle pause.
///
/// Failures are logged and never propagated.
async fn release_images(images: Vec<DynamicImage>, delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let count = images.len();
    if let Err(e) = tokio::task::spawn_blocking(move || drop(images)).await {
        tracing::warn!("Error during cleanup: {}", e);
        return;
    }
    tracing::debug!("Released {} image(s)", count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelError;
    use crate::pdf::PdfError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Model that records its calls and answers `page-{i}`
    #[derive(Default)]
    struct RecordingModel {
        calls: AtomicUsize,
        instructions: Mutex<Vec<String>>,
        fixed: Option<Vec<String>>,
    }

    #[async_trait]
    impl RecognitionModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn batch_inference(
            &self,
            images: &[DynamicImage],
            instructions: &[String],
        ) -> Result<Vec<String>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.instructions.lock().unwrap().extend(instructions.iter().cloned());
            if let Some(fixed) = &self.fixed {
                return Ok(fixed.clone());
            }
            // Page width encodes the page number
            Ok(images.iter().map(|img| format!("page-{}", img.width())).collect())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl RecognitionModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn batch_inference(&self, _: &[DynamicImage], _: &[String]) -> Result<Vec<String>, ModelError> {
            Err(ModelError::Inference("CUDA out of memory".into()))
        }
    }

    struct SlowModel;

    #[async_trait]
    impl RecognitionModel for SlowModel {
        fn name(&self) -> &str {
            "slow"
        }

        async fn batch_inference(&self, images: &[DynamicImage], _: &[String]) -> Result<Vec<String>, ModelError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![String::new(); images.len()])
        }
    }

    /// Produces `pages` images whose widths are 1..=pages
    struct FakeRasterizer {
        pages: u32,
    }

    impl PageRasterizer for FakeRasterizer {
        fn rasterize(&self, _path: &Path) -> Result<Vec<DynamicImage>, PdfError> {
            Ok((1..=self.pages).map(|w| DynamicImage::new_rgb8(w, 1)).collect())
        }
    }

    struct BrokenRasterizer;

    impl PageRasterizer for BrokenRasterizer {
        fn rasterize(&self, _path: &Path) -> Result<Vec<DynamicImage>, PdfError> {
            Err(PdfError::Render {
                page: 2,
                message: "corrupt content stream".into(),
            })
        }
    }

    struct SlowRasterizer;

    impl PageRasterizer for SlowRasterizer {
        fn rasterize(&self, _path: &Path) -> Result<Vec<DynamicImage>, PdfError> {
            std::thread::sleep(Duration::from_secs(2));
            Ok(vec![DynamicImage::new_rgb8(1, 1)])
        }
    }

    fn test_config() -> RecognitionConfig {
        RecognitionConfig {
            cleanup_delay_ms: 0,
            ..RecognitionConfig::default()
        }
    }

    fn pipeline_with(rasterizer: impl PageRasterizer + 'static) -> RecognitionPipeline {
        RecognitionPipeline::with_rasterizer(&test_config(), Arc::new(rasterizer))
    }

    fn touch(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        path
    }

    fn write_png(dir: &tempfile::TempDir, name: &str, width: u32) -> PathBuf {
        let path = dir.path().join(name);
        image::RgbImage::new(width, 2).save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_pdf_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(&dir, "paper.pdf");
        let model = RecordingModel::default();

        let output = pipeline_with(FakeRasterizer { pages: 3 })
            .recognize(&pdf, &model, "text")
            .await
            .unwrap();

        assert_eq!(output.page_count, 3);
        assert_eq!(output.text, "page-1\n\npage-2\n\npage-3");
        assert_eq!(output.text.matches(PAGE_SEPARATOR).count(), 2);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_instruction_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(&dir, "tables.PDF");
        let model = RecordingModel::default();

        pipeline_with(FakeRasterizer { pages: 4 })
            .recognize(&pdf, &model, "table")
            .await
            .unwrap();

        let instructions = model.instructions.lock().unwrap();
        assert_eq!(instructions.len(), 4);
        assert!(instructions.iter().all(|i| i == Task::Table.instruction()));
    }

    #[tokio::test]
    async fn test_single_image_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(&dir, "eq.png", 7);
        let model = RecordingModel {
            fixed: Some(vec!["a\n\nb".to_string()]),
            ..RecordingModel::default()
        };

        let output = pipeline_with(BrokenRasterizer)
            .recognize(&png, &model, "formula")
            .await
            .unwrap();

        assert_eq!(output.page_count, 1);
        assert_eq!(output.text, "a\n\nb");
        assert_eq!(
            model.instructions.lock().unwrap().as_slice(),
            &[Task::Formula.instruction().to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_task_falls_back_to_text() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(&dir, "scan.png", 3);
        let model = RecordingModel::default();

        pipeline_with(BrokenRasterizer)
            .recognize(&png, &model, "handwriting")
            .await
            .unwrap();

        assert_eq!(
            model.instructions.lock().unwrap().as_slice(),
            &[Task::Text.instruction().to_string()]
        );
    }

    #[tokio::test]
    async fn test_strict_tasks_reject_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(&dir, "scan.png", 3);
        let model = RecordingModel::default();
        let config = RecognitionConfig {
            strict_tasks: true,
            ..test_config()
        };
        let pipeline = RecognitionPipeline::with_rasterizer(&config, Arc::new(BrokenRasterizer));

        let err = pipeline.recognize(&png, &model, "handwriting").await.unwrap_err();
        assert!(matches!(err, RecognitionError::InvalidTask(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_input_never_invokes_model() {
        let dir = tempfile::tempdir().unwrap();
        let docx = touch(&dir, "report.docx");
        let model = RecordingModel::default();

        let err = pipeline_with(FakeRasterizer { pages: 2 })
            .recognize(&docx, &model, "text")
            .await
            .unwrap_err();

        assert!(matches!(err, RecognitionError::UnsupportedInput(ext) if ext == "docx"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_file_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.docx");
        let model = RecordingModel::default();
        let config = RecognitionConfig {
            strict_tasks: true,
            ..test_config()
        };
        let pipeline = RecognitionPipeline::with_rasterizer(&config, Arc::new(FakeRasterizer { pages: 1 }));

        // Unknown task and unsupported extension are not reported
        let err = pipeline.recognize(&missing, &model, "bogus").await.unwrap_err();
        assert!(matches!(err, RecognitionError::NotFound(p) if p == missing));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = RecordingModel::default();

        let err = pipeline_with(FakeRasterizer { pages: 1 })
            .recognize(dir.path(), &model, "text")
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rasterization_failure_fails_request() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(&dir, "broken.pdf");
        let model = RecordingModel::default();

        let err = pipeline_with(BrokenRasterizer)
            .recognize(&pdf, &model, "text")
            .await
            .unwrap_err();

        assert!(matches!(err, RecognitionError::Conversion(msg) if msg.contains("page 2")));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_pdf_is_conversion_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(&dir, "empty.pdf");
        let model = RecordingModel::default();

        let err = pipeline_with(FakeRasterizer { pages: 0 })
            .recognize(&pdf, &model, "text")
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Conversion(_)));
    }

    #[tokio::test]
    async fn test_undecodable_image_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"not a png").unwrap();
        let model = RecordingModel::default();

        let err = pipeline_with(BrokenRasterizer)
            .recognize(&path, &model, "text")
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Failed(_)));
        assert!(err.to_string().starts_with("Single task recognition failed"));
    }

    #[tokio::test]
    async fn test_inference_failure() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(&dir, "page.png", 2);

        let err = pipeline_with(BrokenRasterizer)
            .recognize(&png, &FailingModel, "text")
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Inference(msg) if msg.contains("CUDA out of memory")));
    }

    #[tokio::test]
    async fn test_result_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(&dir, "two.pdf");
        let model = RecordingModel {
            fixed: Some(vec!["only one".to_string()]),
            ..RecordingModel::default()
        };

        let err = pipeline_with(FakeRasterizer { pages: 2 })
            .recognize(&pdf, &model, "text")
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Inference(_)));
    }

    #[tokio::test]
    async fn test_inference_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(&dir, "page.png", 2);
        let config = RecognitionConfig {
            inference_timeout_secs: 1,
            ..test_config()
        };
        let pipeline = RecognitionPipeline::with_rasterizer(&config, Arc::new(BrokenRasterizer));

        let err = pipeline.recognize(&png, &SlowModel, "text").await.unwrap_err();
        assert!(matches!(err, RecognitionError::Timeout { stage: "inference", secs: 1 }));
    }

    #[tokio::test]
    async fn test_render_timeout_skips_inference() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = touch(&dir, "slow.pdf");
        let model = RecordingModel::default();
        let config = RecognitionConfig {
            render_timeout_secs: 1,
            ..test_config()
        };
        let pipeline = RecognitionPipeline::with_rasterizer(&config, Arc::new(SlowRasterizer));

        let err = pipeline.recognize(&pdf, &model, "text").await.unwrap_err();

        assert!(matches!(err, RecognitionError::Timeout { stage: "PDF rendering", secs: 1 }));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_settle_pause_before_release() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(&dir, "page.png", 3);
        let model = RecordingModel::default();
        let config = RecognitionConfig {
            cleanup_delay_ms: 20,
            ..test_config()
        };
        let pipeline = RecognitionPipeline::with_rasterizer(&config, Arc::new(BrokenRasterizer));

        let start = Instant::now();
        let output = pipeline.recognize(&png, &model, "text").await.unwrap();

        assert_eq!(output.text, "page-3");
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_result_written_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let pdf = touch(&dir, "paper.pdf");
        let model = RecordingModel::default();
        let config = RecognitionConfig {
            output_dir: Some(out.path().to_path_buf()),
            ..test_config()
        };
        let pipeline = RecognitionPipeline::with_rasterizer(&config, Arc::new(FakeRasterizer { pages: 2 }));

        let output = pipeline.recognize(&pdf, &model, "formula").await.unwrap();

        let saved = std::fs::read_to_string(out.path().join("paper_formula_result.md")).unwrap();
        assert_eq!(saved, output.text);
    }
}
