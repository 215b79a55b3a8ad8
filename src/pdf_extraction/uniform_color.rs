// Color-uniformity heuristic used to drop decorative images
use image::DynamicImage;
use std::collections::HashMap;
use tracing::debug;

use crate::config::ImageFilter;

/// Pixel counts per distinct RGBA color
#[derive(Debug, Default, Clone)]
pub struct ColorHistogram {
    counts: HashMap<[u8; 4], u64>,
    total: u64,
}

impl ColorHistogram {
    pub fn from_image(image: &DynamicImage) -> Self {
        let mut histogram = Self::default();
        for pixel in image.to_rgba8().pixels() {
            *histogram.counts.entry(pixel.0).or_insert(0) += 1;
            histogram.total += 1;
        }
        histogram
    }

    pub fn unique_colors(&self) -> usize {
        self.counts.len()
    }

    /// Share of all pixels taken by the most frequent color
    pub fn dominant_share(&self) -> f64 {
        match self.counts.values().max() {
            Some(&max) if self.total > 0 => max as f64 / self.total as f64,
            _ => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// True when an encoded image is dominated by very few colors. Bytes that
/// cannot be decoded count as uniform so they never reach the output.
pub fn is_uniform_color(
    image_bytes: &[u8],
    num_unique_colors: usize,
    color_variation_threshold: f64,
) -> bool {
    match image::load_from_memory(image_bytes) {
        Ok(image) => is_uniform_image(&image, num_unique_colors, color_variation_threshold),
        Err(e) => {
            debug!("Treating undecodable image as uniform: {}", e);
            true
        }
    }
}

/// Same check on an already decoded image
pub fn is_uniform_image(
    image: &DynamicImage,
    num_unique_colors: usize,
    color_variation_threshold: f64,
) -> bool {
    let histogram = ColorHistogram::from_image(image);
    if histogram.is_empty() {
        return false;
    }
    if histogram.unique_colors() < num_unique_colors {
        return true;
    }
    histogram.dominant_share() > 1.0 - color_variation_threshold
}

impl ImageFilter {
    /// Size cutoff first, then the uniformity check
    pub fn keeps(&self, image_bytes: &[u8]) -> bool {
        image_bytes.len() > self.min_size
            && !is_uniform_color(
                image_bytes,
                self.min_unique_colors,
                self.color_variation_threshold,
            )
    }
}
