/*---- Vector output ----*/

use crate::config::{Color, RenderConfig};
use crate::error::{Error, Result};
use crate::matrix::ModuleMatrix;

/// Namespace declared on every root `<svg>` element.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Returns SVG markup depicting the matrix with one `<rect>` per dark module.
///
/// Modules are plain squares in every style: rounded or circular primitives
/// rasterize inconsistently across viewers, so styling is left to the PNG
/// path. Coordinates are in module units (quiet zone included) and the root
/// `width`/`height` equal `config.pixel_size`. The `xmlns` attribute is always
/// written. The string uses Unix newlines (\n) regardless of platform.
///
/// # Errors
///
/// * [`Error::InvalidMatrix`] for an empty matrix.
/// * [`Error::Validation`] for a zero pixel size.
///
/// # Example
///
/// ```rust
/// use qrstyle::config::{EcLevel, RenderConfig};
/// use qrstyle::matrix::{QrSymbolEncoder, SymbolEncoder};
/// use qrstyle::svg::to_svg_string;
///
/// let matrix = QrSymbolEncoder.encode("HELLO", EcLevel::M).unwrap();
/// let svg = to_svg_string(&matrix, &RenderConfig::default()).unwrap();
/// assert!(svg.contains("xmlns=\"http://www.w3.org/2000/svg\""));
/// ```
pub fn to_svg_string(matrix: &ModuleMatrix, config: &RenderConfig) -> Result<String> {
    if matrix.size() == 0 {
        return Err(Error::InvalidMatrix("matrix has no modules".into()));
    }
    if config.pixel_size == 0 {
        return Err(Error::Validation("Invalid size: must be a positive integer.".into()));
    }
    let margin = config.margin as usize;
    let dimension = matrix.size() + 2 * margin;

    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += &format!(
        "<svg xmlns=\"{ns}\" version=\"1.1\" width=\"{px}\" height=\"{px}\" viewBox=\"0 0 {dim} {dim}\" shape-rendering=\"crispEdges\">\n",
        ns = SVG_NAMESPACE,
        px = config.pixel_size,
        dim = dimension
    );
    result += &format!("\t<rect width=\"100%\" height=\"100%\"{}/>\n", fill_attrs(config.background));
    result += &format!("\t<g{}>\n", fill_attrs(config.foreground));
    for (row, col) in matrix.dark_modules() {
        result += &format!(
            "\t\t<rect x=\"{}\" y=\"{}\" width=\"1\" height=\"1\"/>\n",
            col + margin,
            row + margin
        );
    }
    result += "\t</g>\n";
    result += "</svg>\n";
    Ok(result)
}

fn fill_attrs(color: Color) -> String {
    if color.is_opaque() {
        format!(" fill=\"{}\"", color)
    } else {
        format!(" fill=\"{}\" fill-opacity=\"{:.3}\"", color, color.opacity())
    }
}
