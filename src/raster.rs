//! Styled PNG rendering.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use log::debug;

use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::geometry::module_shapes;
use crate::matrix::ModuleMatrix;

/// Draws the matrix into a `pixel_size x pixel_size` RGBA image.
///
/// The background fills the whole square; every dark module is drawn with
/// the primitive chosen by [`module_shapes`]. The surface lives only for the
/// duration of this call.
///
/// # Errors
///
/// * [`Error::InvalidMatrix`] for an empty matrix.
/// * [`Error::Validation`] for a zero pixel size.
/// * [`Error::Render`] if the surface cannot be allocated.
pub fn render_image(matrix: &ModuleMatrix, config: &RenderConfig) -> Result<RgbaImage> {
    if matrix.size() == 0 {
        return Err(Error::InvalidMatrix("matrix has no modules".into()));
    }
    if config.pixel_size == 0 {
        return Err(Error::Validation("Invalid size: must be a positive integer.".into()));
    }
    let mut canvas = Canvas::new(config.pixel_size)?;
    let shapes = module_shapes(matrix, config);
    debug!(
        "rasterizing {} modules ({}x{} grid) at {}px, style {:?}",
        shapes.len(),
        matrix.size(),
        matrix.size(),
        config.pixel_size,
        config.style
    );
    for shape in &shapes {
        canvas.fill(shape);
    }
    canvas.composite(config.foreground, config.background)
}

/// Renders the matrix and serializes it as PNG bytes.
///
/// # Example
///
/// ```rust
/// use qrstyle::config::{EcLevel, RenderConfig};
/// use qrstyle::matrix::{QrSymbolEncoder, SymbolEncoder};
/// use qrstyle::raster::render_png;
///
/// let matrix = QrSymbolEncoder.encode("HELLO", EcLevel::M).unwrap();
/// let png = render_png(&matrix, &RenderConfig::default()).unwrap();
/// assert!(png.starts_with(b"\x89PNG"));
/// ```
pub fn render_png(matrix: &ModuleMatrix, config: &RenderConfig) -> Result<Vec<u8>> {
    let img = render_image(matrix, config)?;
    encode_png(&img)
}

/// Serializes an image as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}
