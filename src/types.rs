// Core types and error definitions for pdfharvest
use std::path::PathBuf;

/// PDF object number of an image XObject, as used in output file names.
pub type ImageRef = u32;

/// An image pulled out of a PDF, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub bytes: Vec<u8>,
    /// File extension without the dot: `jpeg`, `jpx` or `png`
    pub ext: &'static str,
    /// Zero-based page index
    pub page: usize,
    pub reference: ImageRef,
}

impl ExtractedImage {
    /// `image{page}_{ref}.{ext}`
    pub fn file_name(&self) -> String {
        format!("image{}_{}.{}", self.page, self.reference, self.ext)
    }
}

/// Naming scheme for images re-encoded as PNG.
pub fn png_file_name(page: usize, index: usize) -> String {
    format!("page_{}_img_{}.png", page, index)
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported stream filter: {0}")]
    UnsupportedFilter(String),

    #[error("Unsupported color space: {0}")]
    UnsupportedColorSpace(String),

    #[error("Malformed image {reference}: {reason}")]
    MalformedImage { reference: ImageRef, reason: String },

    #[error("Config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, HarvestError>;
