// Embedded image extraction
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::image_decode::{decode_image, encode_png, extract_image};
use super::lopdf_helper::{get_resolved, load_pdf, name_of, page_ids};
use crate::config::ImageFilter;
use crate::output::create_output_folder;
use crate::types::{png_file_name, ExtractedImage, Result};

/// Image XObjects drawn by a page, in resource order. Form XObjects are
/// searched recursively and every image is listed once.
pub fn page_images(document: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();
    if let Some(resources) = page_resources(document, page_id) {
        collect_images(document, resources, &mut images, &mut seen);
    }
    images
}

/// Every embedded image of every page, without any filtering
pub fn iter_images(document: &Document) -> impl Iterator<Item = Result<ExtractedImage>> + '_ {
    page_ids(document)
        .into_iter()
        .enumerate()
        .flat_map(move |(page, page_id)| {
            page_images(document, page_id).into_iter().map(move |id| -> Result<ExtractedImage> {
                let encoded = extract_image(document, id)?;
                Ok(ExtractedImage {
                    bytes: encoded.bytes,
                    ext: encoded.ext,
                    page,
                    reference: id.0,
                })
            })
        })
}

/// [`iter_images`] minus the images that fail to extract
fn readable_images(document: &Document) -> impl Iterator<Item = ExtractedImage> + '_ {
    iter_images(document).filter_map(|image| match image {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Skipping image: {}", e);
            None
        }
    })
}

/// Write the informative images of `pdf_path` into `output_folder` as
/// `image{page}_{ref}.{ext}`. Images of `filter.min_size` bytes or less,
/// and images dominated by one color, are skipped.
///
/// Images that cannot be read are skipped with a warning. Any other error
/// stops the extraction; it is logged and the paths written so far are
/// returned.
pub fn extract_images(pdf_path: &Path, output_folder: &Path, filter: &ImageFilter) -> Vec<PathBuf> {
    collect_until_error(pdf_path, output_folder, |document, folder, written| {
        for image in readable_images(document) {
            if !filter.keeps(&image.bytes) {
                debug!("Skipping {} ({} bytes)", image.file_name(), image.bytes.len());
                continue;
            }
            written.push(write_image(folder, &image)?);
        }
        Ok(())
    })
}

/// Like [`extract_images`] but keeps every image
pub fn extract_all_images(pdf_path: &Path, output_folder: &Path) -> Vec<PathBuf> {
    collect_until_error(pdf_path, output_folder, |document, folder, written| {
        for image in readable_images(document) {
            written.push(write_image(folder, &image)?);
        }
        Ok(())
    })
}

/// Decode every embedded image and save it as `page_{page}_img_{index}.png`.
/// Images that cannot be decoded are skipped.
pub fn export_page_images_png(pdf_path: &Path, output_folder: &Path) -> Vec<PathBuf> {
    collect_until_error(pdf_path, output_folder, |document, folder, written| {
        for (page, page_id) in page_ids(document).into_iter().enumerate() {
            debug!("Processing page: {}", page);
            for (index, id) in page_images(document, page_id).into_iter().enumerate() {
                let png = match decode_image(document, id).and_then(|img| encode_png(&img)) {
                    Ok(png) => png,
                    Err(e) => {
                        warn!("Skipping image {} on page {}: {}", id.0, page, e);
                        continue;
                    }
                };
                let path = folder.join(png_file_name(page, index));
                fs::write(&path, png)?;
                debug!("Saved image to {}", path.display());
                written.push(path);
            }
        }
        Ok(())
    })
}

/// Shared driver: resolve the folder, open the document, run `body`, and
/// turn a failure into a log line plus whatever was already written.
fn collect_until_error<F>(pdf_path: &Path, output_folder: &Path, body: F) -> Vec<PathBuf>
where
    F: FnOnce(&Document, &Path, &mut Vec<PathBuf>) -> Result<()>,
{
    let mut written = Vec::new();
    let outcome = create_output_folder(output_folder).and_then(|folder| {
        let document = load_pdf(pdf_path)?;
        body(&document, &folder, &mut written)
    });

    match outcome {
        Ok(()) => info!("Extracted {} images from {}", written.len(), pdf_path.display()),
        Err(e) => error!("An error occurred: {}", e),
    }
    written
}

fn write_image(folder: &Path, image: &ExtractedImage) -> Result<PathBuf> {
    let path = folder.join(image.file_name());
    fs::write(&path, &image.bytes)?;
    debug!("Image written: {} ({} bytes)", path.display(), image.bytes.len());
    Ok(path)
}

/// Resources of a page, inherited from the page tree when absent
fn page_resources(document: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = document.get_object(page_id).ok()?.as_dict().ok()?;
    // Page trees are shallow; the bound only guards against /Parent cycles
    for _ in 0..64 {
        if let Some(Object::Dictionary(resources)) = get_resolved(document, node, b"Resources") {
            return Some(resources);
        }
        node = match get_resolved(document, node, b"Parent") {
            Some(Object::Dictionary(parent)) => parent,
            _ => return None,
        };
    }
    None
}

fn collect_images(
    document: &Document,
    resources: &Dictionary,
    images: &mut Vec<ObjectId>,
    seen: &mut HashSet<ObjectId>,
) {
    let Some(Object::Dictionary(xobjects)) = get_resolved(document, resources, b"XObject") else {
        return;
    };

    for (_, value) in xobjects.iter() {
        let Object::Reference(id) = value else { continue };
        if !seen.insert(*id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = document.get_object(*id) else { continue };

        let subtype = stream.dict.get(b"Subtype").ok().and_then(name_of);
        match subtype.as_deref() {
            Some("Image") => images.push(*id),
            Some("Form") => {
                if let Some(Object::Dictionary(form_resources)) =
                    get_resolved(document, &stream.dict, b"Resources")
                {
                    collect_images(document, form_resources, images, seen);
                }
            }
            _ => {}
        }
    }
}
