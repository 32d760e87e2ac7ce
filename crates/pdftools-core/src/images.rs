//! Image-to-PDF assembly
//!
//! Builds a document with one page per uploaded image. Each image is
//! scaled to fit the page while keeping its aspect ratio, and centered.
//! JPEG data is embedded verbatim under DCTDecode; PNG data is decoded
//! and re-embedded as a flate-compressed RGB stream.

use crate::error::PdfToolsError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Write;

// Letter, in points.
const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;

/// Pixel format of an accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// One image destined for one page.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Build a PDF with one page per image, in input order.
pub fn images_to_pdf(images: &[PageImage]) -> Result<Vec<u8>, PdfToolsError> {
    if images.is_empty() {
        return Err(PdfToolsError::Operation("No images to convert".into()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::with_capacity(images.len());
    for image in images {
        let page_id = add_image_page(&mut doc, pages_id, image)?;
        page_ids.push(Object::Reference(page_id));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        ("Kids", Object::Array(page_ids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfToolsError::Operation(format!("Failed to save PDF: {}", e)))?;

    Ok(buffer)
}

/// Embed one image as an XObject and wrap it in a page that scales it to
/// fit and centers it.
fn add_image_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    image: &PageImage,
) -> Result<lopdf::ObjectId, PdfToolsError> {
    let (xobject, width, height) = match image.format {
        ImageFormat::Jpeg => jpeg_xobject(&image.bytes)?,
        ImageFormat::Png => png_xobject(&image.bytes)?,
    };
    let xobject_id = doc.add_object(xobject);

    let scale = (PAGE_WIDTH / f64::from(width)).min(PAGE_HEIGHT / f64::from(height));
    let draw_width = f64::from(width) * scale;
    let draw_height = f64::from(height) * scale;
    let x = (PAGE_WIDTH - draw_width) / 2.0;
    let y = (PAGE_HEIGHT - draw_height) / 2.0;

    let content = format!(
        "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im0 Do\nQ",
        draw_width, draw_height, x, y
    );
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(xobject_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let page = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH as f32),
                Object::Real(PAGE_HEIGHT as f32),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]);

    Ok(doc.add_object(page))
}

/// JPEG passes through untouched; viewers decode it via DCTDecode.
fn jpeg_xobject(bytes: &[u8]) -> Result<(Object, u32, u32), PdfToolsError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
        .map_err(|e| PdfToolsError::UnsupportedImage(e.to_string()))?;
    let (width, height) = img.dimensions();

    let color_space: &[u8] = if img.color().has_color() {
        b"DeviceRGB"
    } else {
        b"DeviceGray"
    };

    let dict = image_dict(width, height, color_space, b"DCTDecode");
    Ok((
        Object::Stream(Stream::new(dict, bytes.to_vec())),
        width,
        height,
    ))
}

/// PNG is decoded to raw RGB and recompressed with flate.
fn png_xobject(bytes: &[u8]) -> Result<(Object, u32, u32), PdfToolsError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| PdfToolsError::UnsupportedImage(e.to_string()))?;
    let (width, height) = img.dimensions();
    let rgb = img.to_rgb8();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(rgb.as_raw())
        .map_err(|e| PdfToolsError::Operation(format!("Failed to compress image data: {}", e)))?;
    let data = encoder
        .finish()
        .map_err(|e| PdfToolsError::Operation(format!("Failed to compress image data: {}", e)))?;

    let dict = image_dict(width, height, b"DeviceRGB", b"FlateDecode");
    Ok((Object::Stream(Stream::new(dict, data)), width, height))
}

fn image_dict(width: u32, height: u32, color_space: &[u8], filter: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width)));
    dict.set("Height", Object::Integer(i64::from(height)));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(filter.to_vec()));
    dict
}
