// Turning PDF image XObjects into encoded image files
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;

use super::lopdf_helper::{get_int, get_resolved, name_of, resolve, stream_filters};
use crate::types::{HarvestError, ImageRef, Result};

/// Encoded bytes plus the file extension matching them
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub ext: &'static str,
}

/// Color space of an image stream, reduced to what we can decode
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of base-space colors, already converted to RGB triples
    Indexed(Vec<[u8; 3]>),
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed(_) => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }
}

/// Raw bytes for JPEG and JPEG 2000 streams, PNG for everything else
pub fn extract_image(document: &Document, id: ObjectId) -> Result<EncodedImage> {
    let stream = image_stream(document, id)?;
    let filters = stream_filters(document, &stream.dict);

    match filters.last().map(String::as_str) {
        Some("DCTDecode") | Some("DCT") if filters.len() == 1 => {
            return Ok(EncodedImage { bytes: stream.content.clone(), ext: "jpeg" });
        }
        Some("JPXDecode") if filters.len() == 1 => {
            return Ok(EncodedImage { bytes: stream.content.clone(), ext: "jpx" });
        }
        _ => {}
    }

    let image = decode_pixels(document, id, stream, &filters)?;
    Ok(EncodedImage { bytes: encode_png(&image)?, ext: "png" })
}

/// Decode an image XObject to pixels, whatever its encoding
pub fn decode_image(document: &Document, id: ObjectId) -> Result<DynamicImage> {
    let stream = image_stream(document, id)?;
    let filters = stream_filters(document, &stream.dict);
    decode_pixels(document, id, stream, &filters)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn image_stream(document: &Document, id: ObjectId) -> Result<&Stream> {
    match document.get_object(id)? {
        Object::Stream(stream) => Ok(stream),
        _ => Err(malformed(id.0, "not a stream")),
    }
}

fn decode_pixels(
    document: &Document,
    id: ObjectId,
    stream: &Stream,
    filters: &[String],
) -> Result<DynamicImage> {
    match filters.last().map(String::as_str) {
        Some("DCTDecode") | Some("DCT") if filters.len() == 1 => {
            return Ok(image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?);
        }
        Some("DCTDecode") | Some("DCT") => {
            return Err(HarvestError::UnsupportedFilter(filters.join(" ")));
        }
        Some("JPXDecode") => {
            return Err(HarvestError::UnsupportedFilter("JPXDecode".to_string()));
        }
        _ => {}
    }

    let dict = &stream.dict;
    let width = dimension(document, dict, b"Width", id.0)?;
    let height = dimension(document, dict, b"Height", id.0)?;
    let data = decode_leading_filters(stream, filters)?;

    let is_mask = matches!(get_resolved(document, dict, b"ImageMask"), Some(Object::Boolean(true)));
    let (color_space, bpc) = if is_mask {
        (ColorSpace::Gray, 1)
    } else {
        let bpc = get_int(document, dict, b"BitsPerComponent").unwrap_or(8) as u32;
        let cs = match get_resolved(document, dict, b"ColorSpace") {
            Some(obj) => parse_color_space(document, obj)?,
            None => ColorSpace::Gray,
        };
        (cs, bpc)
    };

    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(malformed(id.0, &format!("{} bits per component", bpc)));
    }

    let samples = unpack_samples(&data, width, height, color_space.components(), bpc)
        .ok_or_else(|| malformed(id.0, "stream shorter than its dimensions"))?;
    let decode = decode_ranges(document, dict, color_space.components());

    let image = match &color_space {
        ColorSpace::Gray => {
            let mut pixels = scale_samples(&samples, bpc);
            apply_decode(&mut pixels, decode.as_deref());
            if is_mask {
                // Stencil masks paint where the sample is 0
                pixels.iter_mut().for_each(|p| *p = 255 - *p);
            }
            GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
        }
        ColorSpace::Rgb => {
            let mut pixels = scale_samples(&samples, bpc);
            apply_decode(&mut pixels, decode.as_deref());
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        }
        ColorSpace::Cmyk => {
            let mut pixels = scale_samples(&samples, bpc);
            apply_decode(&mut pixels, decode.as_deref());
            let rgb = pixels
                .chunks_exact(4)
                .flat_map(|c| cmyk_to_rgb(c[0], c[1], c[2], c[3]))
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        ColorSpace::Indexed(palette) => {
            let fallback = [0, 0, 0];
            let max = ((1u32 << bpc) - 1) as f32;
            let index = |s: u16| match decode.as_deref() {
                Some(&[(lo, hi)]) => (lo + s as f32 * (hi - lo) / max).round().max(0.0) as usize,
                _ => s as usize,
            };
            let rgb = samples
                .iter()
                .flat_map(|&s| *palette.get(index(s)).unwrap_or(&fallback))
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
    };

    image.ok_or_else(|| malformed(id.0, "pixel buffer does not match dimensions"))
}

/// `/Decode` as one (min, max) pair per component, when present and well formed
fn decode_ranges(document: &Document, dict: &Dictionary, components: usize) -> Option<Vec<(f32, f32)>> {
    let Some(Object::Array(arr)) = get_resolved(document, dict, b"Decode") else {
        return None;
    };
    let values: Vec<f32> = arr
        .iter()
        .filter_map(|o| match resolve(document, o).ok()? {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(f) => Some(*f as f32),
            _ => None,
        })
        .collect();
    if values.len() != components * 2 {
        return None;
    }
    Some(values.chunks_exact(2).map(|p| (p[0], p[1])).collect())
}

/// Map 0..=255 samples through their component's decode range
fn apply_decode(pixels: &mut [u8], ranges: Option<&[(f32, f32)]>) {
    let Some(ranges) = ranges else { return };
    if ranges.iter().all(|&r| r == (0.0, 1.0)) {
        return;
    }
    for (i, p) in pixels.iter_mut().enumerate() {
        let (lo, hi) = ranges[i % ranges.len()];
        *p = (lo * 255.0 + *p as f32 * (hi - lo)).round().clamp(0.0, 255.0) as u8;
    }
}

fn decode_leading_filters(stream: &Stream, filters: &[String]) -> Result<Vec<u8>> {
    if filters.is_empty() {
        return Ok(stream.content.clone());
    }
    for filter in filters {
        if !matches!(filter.as_str(), "FlateDecode" | "Fl" | "LZWDecode" | "LZW") {
            return Err(HarvestError::UnsupportedFilter(filter.clone()));
        }
    }
    Ok(stream.decompressed_content()?)
}

fn dimension(document: &Document, dict: &Dictionary, key: &[u8], reference: ImageRef) -> Result<u32> {
    match get_int(document, dict, key) {
        Some(v) if v > 0 => Ok(v as u32),
        _ => Err(malformed(
            reference,
            &format!("missing or invalid /{}", String::from_utf8_lossy(key)),
        )),
    }
}

fn parse_color_space(document: &Document, object: &Object) -> Result<ColorSpace> {
    match object {
        Object::Name(n) => match n.as_slice() {
            b"DeviceGray" | b"G" | b"CalGray" => Ok(ColorSpace::Gray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
            other => Err(HarvestError::UnsupportedColorSpace(
                String::from_utf8_lossy(other).to_string(),
            )),
        },
        Object::Array(arr) => {
            let family = arr
                .first()
                .and_then(|o| resolve(document, o).ok())
                .and_then(name_of)
                .unwrap_or_default();
            match family.as_str() {
                "CalGray" => Ok(ColorSpace::Gray),
                "CalRGB" => Ok(ColorSpace::Rgb),
                "ICCBased" => icc_color_space(document, arr),
                "Indexed" | "I" => indexed_color_space(document, arr),
                _ => Err(HarvestError::UnsupportedColorSpace(family)),
            }
        }
        _ => Err(HarvestError::UnsupportedColorSpace(format!("{:?}", object))),
    }
}

fn icc_color_space(document: &Document, arr: &[Object]) -> Result<ColorSpace> {
    let profile = arr
        .get(1)
        .and_then(|o| resolve(document, o).ok())
        .and_then(|o| o.as_stream().ok());
    let components = profile.and_then(|s| get_int(document, &s.dict, b"N")).unwrap_or(3);
    match components {
        1 => Ok(ColorSpace::Gray),
        3 => Ok(ColorSpace::Rgb),
        4 => Ok(ColorSpace::Cmyk),
        n => Err(HarvestError::UnsupportedColorSpace(format!("ICCBased with {} components", n))),
    }
}

fn indexed_color_space(document: &Document, arr: &[Object]) -> Result<ColorSpace> {
    let base = match arr.get(1).map(|o| resolve(document, o)) {
        Some(Ok(obj)) => parse_color_space(document, obj)?,
        _ => return Err(HarvestError::UnsupportedColorSpace("Indexed without base".to_string())),
    };
    if let ColorSpace::Indexed(_) = base {
        return Err(HarvestError::UnsupportedColorSpace("nested Indexed".to_string()));
    }

    let lookup: Vec<u8> = match arr.get(3).map(|o| resolve(document, o)) {
        Some(Ok(Object::String(bytes, _))) => bytes.clone(),
        Some(Ok(Object::Stream(s))) => {
            if s.dict.get(b"Filter").is_ok() {
                s.decompressed_content()?
            } else {
                s.content.clone()
            }
        }
        _ => return Err(HarvestError::UnsupportedColorSpace("Indexed without lookup".to_string())),
    };

    let palette = lookup
        .chunks_exact(base.components())
        .map(|c| match &base {
            ColorSpace::Gray => [c[0], c[0], c[0]],
            ColorSpace::Cmyk => cmyk_to_rgb(c[0], c[1], c[2], c[3]),
            _ => [c[0], c[1], c[2]],
        })
        .collect();
    Ok(ColorSpace::Indexed(palette))
}

/// Split rows of packed samples into one value per sample. 16-bit samples
/// keep their high byte. Rows are padded to a byte boundary.
fn unpack_samples(data: &[u8], width: u32, height: u32, components: usize, bpc: u32) -> Option<Vec<u16>> {
    let per_row = width as usize * components;
    let row_bytes = (per_row * bpc as usize).div_ceil(8);
    if data.len() < row_bytes * height as usize {
        return None;
    }

    let mut samples = Vec::with_capacity(per_row * height as usize);
    for row in data.chunks_exact(row_bytes).take(height as usize) {
        match bpc {
            8 => samples.extend(row.iter().map(|&b| b as u16)),
            16 => samples.extend(row.chunks_exact(2).map(|p| p[0] as u16)),
            _ => {
                let mask = (1u16 << bpc) - 1;
                let per_byte = 8 / bpc as usize;
                samples.extend(
                    row.iter()
                        .flat_map(|&b| {
                            (0..per_byte).map(move |i| {
                                let shift = 8 - bpc as usize * (i + 1);
                                (b as u16 >> shift) & mask
                            })
                        })
                        .take(per_row),
                );
            }
        }
    }
    Some(samples)
}

/// Stretch samples of `bpc` bits to the 0..=255 range
fn scale_samples(samples: &[u16], bpc: u32) -> Vec<u8> {
    match bpc {
        8 | 16 => samples.iter().map(|&s| s as u8).collect(),
        _ => {
            let max = (1u32 << bpc) - 1;
            samples.iter().map(|&s| (s as u32 * 255 / max) as u8).collect()
        }
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - k as u32;
    [
        ((255 - c as u32) * k / 255) as u8,
        ((255 - m as u32) * k / 255) as u8,
        ((255 - y as u32) * k / 255) as u8,
    ]
}

fn malformed(reference: ImageRef, reason: &str) -> HarvestError {
    HarvestError::MalformedImage { reference, reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bit_rows_are_byte_padded() {
        // 3 pixels wide: each row uses the top 3 bits of one byte
        let data = [0b1010_0000, 0b0110_0000];
        let samples = unpack_samples(&data, 3, 2, 1, 1).unwrap();
        assert_eq!(samples, vec![1, 0, 1, 0, 1, 1]);
        assert_eq!(scale_samples(&samples, 1), vec![255, 0, 255, 0, 255, 255]);
    }

    #[test]
    fn short_stream_is_rejected() {
        assert!(unpack_samples(&[0; 5], 2, 1, 3, 8).is_none());
    }

    #[test]
    fn inverted_decode_flips_samples() {
        let mut pixels = vec![0, 55, 255];
        let inverted = [(1.0, 0.0)];
        apply_decode(&mut pixels, Some(&inverted[..]));
        assert_eq!(pixels, vec![255, 200, 0]);
    }

    #[test]
    fn identity_decode_leaves_samples() {
        let mut pixels = vec![0, 55, 255, 9];
        let identity = [(0.0, 1.0); 4];
        apply_decode(&mut pixels, Some(&identity[..]));
        assert_eq!(pixels, vec![0, 55, 255, 9]);
    }

    #[test]
    fn cmyk_black_and_white() {
        assert_eq!(cmyk_to_rgb(0, 0, 0, 0), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(0, 0, 0, 255), [0, 0, 0]);
    }
}
