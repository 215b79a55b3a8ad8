// Output folder handling
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::Result;

/// Create `folder` (and any missing parents) if it does not exist, and
/// return its absolute path. Calling it again is a no-op.
pub fn create_output_folder(folder: &Path) -> Result<PathBuf> {
    if !folder.exists() {
        info!("Creating folder: {}", folder.display());
        fs::create_dir_all(folder)?;
    }
    Ok(std::path::absolute(folder)?)
}
