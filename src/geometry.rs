//! Placement of module primitives in pixel space.
//!
//! Cell size is kept real-valued: truncating it would leave a growing gap
//! between modules as the column index increases.

use crate::config::{RenderConfig, Style};
use crate::eye::is_eye_cell;
use crate::matrix::ModuleMatrix;

/// Corner radius of eye modules relative to the cell size.
pub const EYE_CORNER_RATIO: f32 = 0.2;
/// Dot radius of data modules relative to the cell size; below 0.5 so
/// neighbouring dots never touch.
pub const DOT_RADIUS_RATIO: f32 = 0.4;

/// Pixel placement of the symbol grid inside the output square.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CellGeometry {
    /// Pixels per module.
    pub cell_size: f32,
    /// Quiet zone in modules.
    pub margin: u32,
}

impl CellGeometry {
    /// Spreads `matrix_size + 2 * margin` modules across `pixel_size` pixels.
    pub fn new(pixel_size: u32, matrix_size: usize, margin: u32) -> Self {
        let modules = matrix_size as f32 + 2.0 * margin as f32;
        CellGeometry {
            cell_size: pixel_size as f32 / modules,
            margin,
        }
    }

    /// Top-left pixel corner of the cell at `(row, col)` as `(x, y)`.
    pub fn origin(&self, row: usize, col: usize) -> (f32, f32) {
        let m = self.margin as f32;
        ((col as f32 + m) * self.cell_size, (row as f32 + m) * self.cell_size)
    }
}

/// A filled primitive in pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Square { x: f32, y: f32, side: f32 },
    /// Corner radii run clockwise from the top-left: `[tl, tr, br, bl]`.
    RoundedSquare { x: f32, y: f32, side: f32, radii: [f32; 4] },
    Circle { cx: f32, cy: f32, radius: f32 },
}

/// Lays out one primitive per dark module according to `config.style`.
///
/// `Plain` yields squares only. `Dotted` yields circles for data modules and
/// draws finder patterns as solid blocks: an eye cell only rounds the corners
/// where both adjoining sides face light or non-eye modules, so each ring
/// reads as one shape with soft outer corners.
pub fn module_shapes(matrix: &ModuleMatrix, config: &RenderConfig) -> Vec<Shape> {
    let n = matrix.size();
    let geometry = CellGeometry::new(config.pixel_size, n, config.margin);
    let side = geometry.cell_size;
    matrix
        .dark_modules()
        .map(|(row, col)| {
            let (x, y) = geometry.origin(row, col);
            match config.style {
                Style::Plain => Shape::Square { x, y, side },
                Style::Dotted if is_eye_cell(row, col, n) => Shape::RoundedSquare {
                    x,
                    y,
                    side,
                    radii: eye_corner_radii(matrix, row, col, side * EYE_CORNER_RATIO),
                },
                Style::Dotted => Shape::Circle {
                    cx: x + side / 2.0,
                    cy: y + side / 2.0,
                    radius: side * DOT_RADIUS_RATIO,
                },
            }
        })
        .collect()
}

// Radius per corner of the eye cell at (row, col); zero where a side
// touches another dark eye module.
fn eye_corner_radii(matrix: &ModuleMatrix, row: usize, col: usize, radius: f32) -> [f32; 4] {
    let n = matrix.size();
    let solid = |r: Option<usize>, c: Option<usize>| match (r, c) {
        (Some(r), Some(c)) => matrix.get(r, c) && is_eye_cell(r, c, n),
        _ => false,
    };
    let up = solid(row.checked_sub(1), Some(col));
    let down = solid(Some(row + 1), Some(col));
    let left = solid(Some(row), col.checked_sub(1));
    let right = solid(Some(row), Some(col + 1));
    let soften = |a: bool, b: bool| if a || b { 0.0 } else { radius };
    [soften(up, left), soften(up, right), soften(down, right), soften(down, left)]
}
