//! Recognition Module
//!
//! Single-task recognition over PDFs and images: resolves the task
//! instruction, materializes the input as page images, runs one batch
//! inference call and joins the per-page results.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_parse_server::ocr::RecognitionPipeline;
//!
//! let pipeline = RecognitionPipeline::new(&config.recognition);
//! let model = models.get(OCR_MODEL)?;
//!
//! let output = pipeline
//!     .recognize(Path::new("scan.pdf"), model.as_ref(), "table")
//!     .await?;
//! println!("{} pages\n{}", output.page_count, output.text);
//! ```

mod input;
mod pipeline;
mod sink;
mod task;
mod types;

pub use input::InputKind;
pub use pipeline::{RecognitionPipeline, PAGE_SEPARATOR};
pub use sink::ResultSink;
pub use task::Task;
pub use types::{RecognitionError, RecognitionOutput};
