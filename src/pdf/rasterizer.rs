//! MuPDF page rasterizer

use std::path::Path;

use image::{DynamicImage, RgbImage};
use mupdf::{Colorspace, Document, Matrix};

/// PDF rasterization error types
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    Open(String),

    #[error("Failed to render page {page}: {message}")]
    Render { page: usize, message: String },

    #[error("Image error: {0}")]
    ImageError(String),
}

impl From<mupdf::Error> for PdfError {
    fn from(err: mupdf::Error) -> Self {
        PdfError::Open(err.to_string())
    }
}

/// Converts a PDF file into one image per page, in page order.
///
/// Implementations are blocking and are called from the blocking pool.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, path: &Path) -> Result<Vec<DynamicImage>, PdfError>;
}

/// MuPDF-backed rasterizer
#[derive(Debug, Clone)]
pub struct MupdfRasterizer {
    dpi: u32,
}

impl MupdfRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi: dpi.clamp(36, 600) }
    }

    /// Scale factor relative to PDF points (72 per inch)
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}

impl Default for MupdfRasterizer {
    fn default() -> Self {
        Self::new(200)
    }
}

impl PageRasterizer for MupdfRasterizer {
    fn rasterize(&self, path: &Path) -> Result<Vec<DynamicImage>, PdfError> {
        let path_str = path.to_string_lossy();
        let doc = Document::open(&*path_str)?;
        let page_count = doc.page_count()? as usize;

        let scale = self.scale();
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();

        let mut images = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let render_err = |e: mupdf::Error| PdfError::Render {
                page: index + 1,
                message: e.to_string(),
            };
            let page = doc.load_page(index as i32).map_err(render_err)?;
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, true)
                .map_err(render_err)?;
            images.push(pixmap_to_image(&pixmap)?);
        }

        tracing::debug!("Rasterized {} pages from {} at {} dpi", images.len(), path.display(), self.dpi);
        Ok(images)
    }
}

fn pixmap_to_image(pixmap: &mupdf::Pixmap) -> Result<DynamicImage, PdfError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(PdfError::ImageError(format!("Unexpected pixmap with {} components", n)));
    }

    let rgb_buffer = samples_to_rgb(pixmap.samples(), width, height, n);
    let img = RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| PdfError::ImageError("Failed to create image buffer".to_string()))?;

    Ok(DynamicImage::ImageRgb8(img))
}

/// Pack `n`-component samples into a tightly packed RGB buffer
fn samples_to_rgb(samples: &[u8], width: u32, height: u32, n: usize) -> Vec<u8> {
    let pixels = width as usize * height as usize;
    let mut rgb_buffer = Vec::with_capacity(pixels * 3);

    for pixel in 0..pixels {
        let offset = pixel * n;
        let r = samples.get(offset).copied().unwrap_or(0);
        let g = samples.get(offset + 1).copied().unwrap_or(0);
        let b = samples.get(offset + 2).copied().unwrap_or(0);
        rgb_buffer.extend_from_slice(&[r, g, b]);
    }

    rgb_buffer
}
