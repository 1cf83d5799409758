//! PDF rasterization module
//!
//! Converts every page of a PDF into an in-memory image using MuPDF.
//! The [`PageRasterizer`] trait is the seam the recognition pipeline
//! depends on; [`MupdfRasterizer`] is the production implementation.

mod rasterizer;

pub use rasterizer::{MupdfRasterizer, PageRasterizer, PdfError};
