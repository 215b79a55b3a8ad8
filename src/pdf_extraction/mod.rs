// PDF extraction module
pub mod image_decode;
pub mod images;
pub mod lopdf_helper;
pub mod text;
pub mod uniform_color;

pub use images::{export_page_images_png, extract_all_images, extract_images, iter_images, page_images};
pub use text::{document_text, extract_text};
pub use uniform_color::{is_uniform_color, is_uniform_image, ColorHistogram};
