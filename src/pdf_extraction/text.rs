// Plain text extraction
use lopdf::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use super::lopdf_helper::with_pdf;
use crate::types::Result;

pub const TEXT_FILE_NAME: &str = "text.txt";

/// Text of every page, concatenated in page order
pub fn document_text(document: &Document) -> Result<String> {
    let mut text = String::new();
    for page_number in document.get_pages().into_keys() {
        text.push_str(&document.extract_text(&[page_number])?);
    }
    Ok(text)
}

/// Write the text of `pdf_path` to `output_folder/text.txt`.
///
/// The folder must already exist. Returns `None` if anything fails; the
/// error is logged.
pub fn extract_text(pdf_path: &Path, output_folder: &Path) -> Option<PathBuf> {
    let result = with_pdf(pdf_path, document_text).and_then(|text| {
        let path = output_folder.join(TEXT_FILE_NAME);
        fs::write(&path, text)?;
        Ok(path)
    });

    match result {
        Ok(path) => {
            info!("Wrote text to {}", path.display());
            Some(path)
        }
        Err(e) => {
            error!("An error occurred: {}", e);
            None
        }
    }
}
