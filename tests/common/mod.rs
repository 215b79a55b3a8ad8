// Fixture PDFs built in memory with lopdf
#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;
use std::path::Path;

/// Deterministic noise so every run produces the same JPEG
pub fn noisy_rgb(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed.max(1);
    RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    })
}

pub fn jpeg_bytes(image: &RgbImage) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
        .unwrap();
    out
}

pub fn jpeg_xobject(image: &RgbImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg_bytes(image),
    )
}

/// Unfiltered 8-bit RGB samples
pub fn raw_rgb_xobject(image: &RgbImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    )
}

pub fn solid_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

/// 100x100 image: the first `white_rows` rows white, every other pixel
/// a distinct color
pub fn dominated_rgb(white_rows: u32) -> RgbImage {
    RgbImage::from_fn(100, 100, |x, y| {
        if y < white_rows { Rgb([255, 255, 255]) } else { Rgb([x as u8, y as u8, 7]) }
    })
}

pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        Self { doc, pages_id, font_id, kids: Vec::new() }
    }

    /// Store an object and hand back its id
    pub fn add_stream(&mut self, stream: Stream) -> ObjectId {
        self.doc.add_object(stream)
    }

    /// Form XObject that draws the given images
    pub fn add_form(&mut self, images: &[ObjectId]) -> ObjectId {
        let (xobjects, operations) = draw_images(images);
        let content = Content { operations }.encode().unwrap();
        self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! { "XObject" => xobjects },
            },
            content,
        ))
    }

    /// Append a page showing `text` and drawing `xobjects` in order
    pub fn page(&mut self, text: &str, xobjects: &[ObjectId]) -> &mut Self {
        let (xobject_dict, mut operations) = draw_images(xobjects);
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, Content { operations }.encode().unwrap()));

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => self.font_id },
            "XObject" => xobject_dict,
        };
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        self
    }

    pub fn save(mut self, path: &Path) {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.save(path).unwrap();
    }
}

fn draw_images(ids: &[ObjectId]) -> (Dictionary, Vec<Operation>) {
    let mut dict = Dictionary::new();
    let mut operations = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let name = format!("Im{}", i);
        dict.set(name.clone(), *id);
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new("cm", vec![100.into(), 0.into(), 0.into(), 100.into(), 0.into(), 0.into()]),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
    }
    (dict, operations)
}
