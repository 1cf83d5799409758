//! Input classification

use std::path::Path;

use super::types::RecognitionError;

/// Kind of input file, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Every page is rasterized
    Pdf,
    /// A single JPEG or PNG image
    Image,
}

impl InputKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            _ => None,
        }
    }

    /// Classify a path, failing with `UnsupportedInput` for other types
    ///
    /// The extension is everything after the last `.` of the file name, so
    /// dotfiles such as `.png` count as images.
    pub fn from_path(path: &Path) -> Result<Self, RecognitionError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        let ext = name.rsplit('.').next().unwrap_or_default();

        Self::from_extension(ext)
            .ok_or_else(|| RecognitionError::UnsupportedInput(ext.to_lowercase()))
    }
}
