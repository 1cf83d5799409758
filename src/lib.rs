//! OCR Parse Server Library
//!
//! This crate exposes the server components for the binary and for
//! integration tests. The main server binary is in main.rs.
//!
//! # Modules
//!
//! - `models`: Recognition model trait, backends and the model manager
//! - `ocr`: Single-task recognition pipeline
//! - `pdf`: PDF page rasterization via MuPDF
//! - `routes`: HTTP endpoints

pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod routes;
pub mod state;
