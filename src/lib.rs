//! Pull embedded images and plain text out of native PDF documents.
//!
//! Images that carry no information (too few bytes, or one color covering
//! most of the picture) are dropped before anything is written.

pub mod config;
pub mod output;
pub mod pdf_extraction;
pub mod types;

pub use config::{HarvestConfig, ImageFilter};
pub use output::create_output_folder;
pub use pdf_extraction::{
    export_page_images_png, extract_all_images, extract_images, extract_text, is_uniform_color,
};
pub use types::{ExtractedImage, HarvestError, Result};
