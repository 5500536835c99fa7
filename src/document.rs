//! Single-page PDF container for a raster image.

use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::config::Color;
use crate::error::{Error, Result};

/// Wraps a raster in a one-page PDF whose page is exactly the image size in
/// points, with the image drawn at the origin and no margin.
///
/// Transparency is flattened onto white since the image is embedded as
/// `DeviceRGB`.
///
/// # Errors
///
/// Returns [`Error::Encode`] for an empty raster or if the document cannot
/// be serialized.
pub fn embed_image(img: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::Encode("cannot embed an empty raster".into()));
    }
    let rgb: Vec<u8> = img.pixels().flat_map(|p| flatten_on(p.0, Color::WHITE)).collect();
    build_document(width, height, rgb)
}

fn flatten_on(rgba: [u8; 4], backdrop: Color) -> [u8; 3] {
    let alpha = f32::from(rgba[3]) / 255.0;
    let back = backdrop.to_rgba();
    let mix = |i: usize| (f32::from(back[i]) + (f32::from(rgba[i]) - f32::from(back[i])) * alpha).round() as u8;
    [mix(0), mix(1), mix(2)]
}

fn build_document(width: u32, height: u32, rgb: Vec<u8>) -> Result<Vec<u8>> {
    let (w, h) = (i64::from(width), i64::from(height));
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w,
            "Height" => h,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb,
    ));

    // Scale the unit image square to the full page.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| Error::Encode(format!("cannot encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| Error::Encode(format!("cannot write document: {}", e)))?;
    Ok(bytes)
}
