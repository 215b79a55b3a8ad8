// Configuration for pdfharvest, loaded from TOML
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{HarvestError, Result};

pub const DEFAULT_MIN_SIZE: usize = 6000;
pub const DEFAULT_MIN_UNIQUE_COLORS: usize = 100;
pub const DEFAULT_COLOR_VARIATION_THRESHOLD: f64 = 0.40;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HarvestConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub images: ImageFilter,
}

/// Thresholds that decide whether an embedded image is worth keeping.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct ImageFilter {
    /// Images must be strictly larger than this many bytes
    #[serde(default = "default_min_size")]
    pub min_size: usize,
    /// Images with fewer distinct colors are considered uniform
    #[serde(default = "default_min_unique_colors")]
    pub min_unique_colors: usize,
    /// An image is uniform when its most common color covers more than
    /// `1 - color_variation_threshold` of all pixels
    #[serde(default = "default_color_variation_threshold")]
    pub color_variation_threshold: f64,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            min_unique_colors: default_min_unique_colors(),
            color_variation_threshold: default_color_variation_threshold(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            images: ImageFilter::default(),
        }
    }
}

fn default_output_dir() -> PathBuf { PathBuf::from(DEFAULT_OUTPUT_DIR) }
fn default_min_size() -> usize { DEFAULT_MIN_SIZE }
fn default_min_unique_colors() -> usize { DEFAULT_MIN_UNIQUE_COLORS }
fn default_color_variation_threshold() -> f64 { DEFAULT_COLOR_VARIATION_THRESHOLD }

impl HarvestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| HarvestError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| HarvestError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: HarvestConfig = toml::from_str("[images]\nmin_size = 10\n").unwrap();
        assert_eq!(config.images.min_size, 10);
        assert_eq!(config.images.min_unique_colors, DEFAULT_MIN_UNIQUE_COLORS);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("harvest.toml");
        let mut config = HarvestConfig::default();
        config.images.color_variation_threshold = 0.25;
        config.save(&path).unwrap();
        assert_eq!(HarvestConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn bad_toml_names_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "images = [").unwrap();
        let err = HarvestConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
