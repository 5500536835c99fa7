//! Transport encodings for rendered images.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbaImage;

use crate::document::embed_image;
use crate::error::{Error, Result};
use crate::raster::encode_png;

/// What a [`RenderedImage`] holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Svg,
}

impl ImageKind {
    pub fn media_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Svg => "svg",
        }
    }
}

/// A freshly rendered image, not yet serialized for transport. Never cached.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderedImage {
    /// Pixels, serialized as PNG or embedded in a document on output.
    Raster(RgbaImage),
    /// SVG markup for a `size x size` pixel viewport.
    Vector { size: u32, markup: String },
}

impl RenderedImage {
    pub fn kind(&self) -> ImageKind {
        match self {
            RenderedImage::Raster(_) => ImageKind::Png,
            RenderedImage::Vector { .. } => ImageKind::Svg,
        }
    }

    /// Width and height in pixels.
    pub fn size(&self) -> u32 {
        match self {
            RenderedImage::Raster(img) => img.width(),
            RenderedImage::Vector { size, .. } => *size,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            RenderedImage::Raster(img) => img.width() == 0 || img.height() == 0,
            RenderedImage::Vector { size, markup } => *size == 0 || markup.is_empty(),
        }
    }

    // Serialized bytes in the image's own media type.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            RenderedImage::Raster(img) => encode_png(img),
            RenderedImage::Vector { markup, .. } => Ok(markup.clone().into_bytes()),
        }
    }
}

/// How the encoded image leaves the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransportMode {
    /// `data:<media type>;base64,<payload>` string.
    InlineDataUri,
    /// Bytes passed through untouched with their media type.
    RawBytes,
    /// Raster wrapped in a single-page PDF.
    EmbeddedDocument,
}

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// The encoded result handed to the transport layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponsePayload {
    DataUri(String),
    Raw {
        media_type: &'static str,
        body: Vec<u8>,
        /// Suggested attachment name.
        filename: String,
    },
}

/// Encodes `image` for the requested transport.
///
/// # Errors
///
/// Returns [`Error::Encode`] for an empty image, or when an embedded document
/// is requested for something other than a raster.
///
/// # Example
///
/// ```rust
/// use qrstyle::output::{encode, RenderedImage, ResponsePayload, TransportMode};
///
/// let image = RenderedImage::Vector {
///     size: 10,
///     markup: "<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_string(),
/// };
/// match encode(&image, TransportMode::InlineDataUri).unwrap() {
///     ResponsePayload::DataUri(uri) => assert!(uri.starts_with("data:image/svg+xml;base64,")),
///     other => panic!("unexpected payload {:?}", other),
/// }
/// ```
pub fn encode(image: &RenderedImage, mode: TransportMode) -> Result<ResponsePayload> {
    if image.is_empty() {
        return Err(Error::Encode("rendered image is empty".into()));
    }
    let kind = image.kind();
    match mode {
        TransportMode::InlineDataUri => Ok(ResponsePayload::DataUri(format!(
            "data:{};base64,{}",
            kind.media_type(),
            STANDARD.encode(image.to_bytes()?)
        ))),
        TransportMode::RawBytes => Ok(ResponsePayload::Raw {
            media_type: kind.media_type(),
            body: image.to_bytes()?,
            filename: format!("qrcode.{}", kind.extension()),
        }),
        TransportMode::EmbeddedDocument => match image {
            RenderedImage::Raster(img) => Ok(ResponsePayload::Raw {
                media_type: PDF_MEDIA_TYPE,
                body: embed_image(img)?,
                filename: "qrcode.pdf".to_string(),
            }),
            RenderedImage::Vector { .. } => Err(Error::Encode(format!(
                "document embedding needs a raster image, got {}",
                kind.media_type()
            ))),
        },
    }
}
