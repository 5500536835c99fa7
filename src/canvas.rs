//! Anti-aliased coverage surface.
//!
//! Shapes accumulate per-pixel coverage in `[0, 1]`; colours are applied once
//! at the end by [`Canvas::composite`]. Summing coverage (instead of blending
//! each shape into the image) keeps shared edges of adjacent modules free of
//! hairline seams.

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::config::Color;
use crate::error::{Error, Result};
use crate::geometry::Shape;

/// A square coverage buffer owned by a single render call.
pub struct Canvas {
    size: u32,
    coverage: Vec<f32>,
}

impl Canvas {
    /// Allocates a `size x size` surface with zero coverage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the buffer cannot be allocated.
    pub fn new(size: u32) -> Result<Self> {
        let len = pixel_count(size)?;
        let mut coverage = Vec::new();
        coverage
            .try_reserve_exact(len)
            .map_err(|e| Error::Render(format!("cannot allocate {}x{} surface: {}", size, size, e)))?;
        coverage.resize(len, 0.0);
        Ok(Canvas { size, coverage })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Coverage of the pixel at `(x, y)`.
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        self.coverage[(y as usize) * (self.size as usize) + x as usize]
    }

    pub fn fill(&mut self, shape: &Shape) {
        match *shape {
            Shape::Square { x, y, side } => self.fill_square(x, y, side),
            Shape::RoundedSquare { x, y, side, radii } => {
                let half = side / 2.0;
                let (cx, cy) = (x + half, y + half);
                let radii = radii.map(|r| r.clamp(0.0, half));
                self.fill_sdf(x, y, x + side, y + side, |px, py| {
                    rounded_square_distance(px - cx, py - cy, half, radii)
                });
            }
            Shape::Circle { cx, cy, radius } => {
                self.fill_sdf(cx - radius, cy - radius, cx + radius, cy + radius, |px, py| {
                    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt() - radius
                });
            }
        }
    }

    // Exact area coverage of an axis-aligned square.
    fn fill_square(&mut self, x: f32, y: f32, side: f32) {
        let (x1, y1) = (x + side, y + side);
        let Some((cols, rows)) = self.span(x, y, x1, y1) else { return };
        for py in rows {
            let oy = overlap(py as f32, y, y1);
            if oy <= 0.0 {
                continue;
            }
            for px in cols.clone() {
                let ox = overlap(px as f32, x, x1);
                self.add(px, py, ox * oy);
            }
        }
    }

    // Coverage from a signed distance evaluated at pixel centres, with a
    // one-pixel linear ramp across the edge.
    fn fill_sdf<F>(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, distance: F)
    where
        F: Fn(f32, f32) -> f32,
    {
        let Some((cols, rows)) = self.span(x0 - 1.0, y0 - 1.0, x1 + 1.0, y1 + 1.0) else { return };
        for py in rows {
            for px in cols.clone() {
                let d = distance(px as f32 + 0.5, py as f32 + 0.5);
                self.add(px, py, (0.5 - d).clamp(0.0, 1.0));
            }
        }
    }

    // Pixel index ranges touched by the box, clipped to the surface.
    fn span(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
        let limit = self.size as f32;
        let clip = |lo: f32, hi: f32| {
            let start = lo.floor().max(0.0);
            let end = hi.ceil().min(limit);
            (start < end).then(|| start as u32..end as u32)
        };
        Some((clip(x0, x1)?, clip(y0, y1)?))
    }

    fn add(&mut self, x: u32, y: u32, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        let i = (y as usize) * (self.size as usize) + x as usize;
        self.coverage[i] = (self.coverage[i] + amount).min(1.0);
    }

    /// Resolves coverage into pixels: `background` where empty, `foreground`
    /// where covered, linearly mixed in between.
    pub fn composite(&self, foreground: Color, background: Color) -> Result<RgbaImage> {
        let len = self.coverage.len() * 4;
        let mut raw = Vec::new();
        raw.try_reserve_exact(len)
            .map_err(|e| Error::Render(format!("cannot allocate {}x{} image: {}", self.size, self.size, e)))?;
        let fg = foreground.to_rgba();
        let bg = background.to_rgba();
        for &c in &self.coverage {
            for channel in 0..4 {
                let (b, f) = (f32::from(bg[channel]), f32::from(fg[channel]));
                raw.push((b + (f - b) * c).round() as u8);
            }
        }
        ImageBuffer::<Rgba<u8>, _>::from_raw(self.size, self.size, raw)
            .ok_or_else(|| Error::Render("pixel buffer does not match surface size".into()))
    }
}

fn pixel_count(size: u32) -> Result<usize> {
    (size as usize)
        .checked_mul(size as usize)
        .ok_or_else(|| Error::Render(format!("surface {}x{} overflows", size, size)))
}

// Length of [p, p + 1] that falls inside [lo, hi].
fn overlap(p: f32, lo: f32, hi: f32) -> f32 {
    ((p + 1.0).min(hi) - p.max(lo)).max(0.0)
}

// Signed distance from a point (relative to the centre) to a square of
// half-side `half`; the quadrant of the point picks its corner radius.
fn rounded_square_distance(dx: f32, dy: f32, half: f32, radii: [f32; 4]) -> f32 {
    let radius = match (dx < 0.0, dy < 0.0) {
        (true, true) => radii[0],
        (false, true) => radii[1],
        (false, false) => radii[2],
        (true, false) => radii[3],
    };
    let qx = dx.abs() - (half - radius);
    let qy = dy.abs() - (half - radius);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    let inside = qx.max(qy).min(0.0);
    outside + inside - radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let canvas = Canvas::new(8).unwrap();
        assert_eq!(canvas.size(), 8);
        assert_eq!(canvas.coverage(7, 7), 0.0);
    }

    #[test]
    fn test_aligned_square_is_crisp() {
        let mut canvas = Canvas::new(10).unwrap();
        canvas.fill(&Shape::Square { x: 2.0, y: 2.0, side: 4.0 });
        assert_eq!(canvas.coverage(2, 2), 1.0);
        assert_eq!(canvas.coverage(5, 5), 1.0);
        assert_eq!(canvas.coverage(6, 5), 0.0);
        assert_eq!(canvas.coverage(1, 2), 0.0);
    }

    #[test]
    fn test_adjacent_fractional_squares_leave_no_seam() {
        let mut canvas = Canvas::new(10).unwrap();
        canvas.fill(&Shape::Square { x: 0.0, y: 0.0, side: 3.5 });
        canvas.fill(&Shape::Square { x: 3.5, y: 0.0, side: 3.0 });
        assert!((canvas.coverage(3, 1) - 1.0).abs() < 1e-6);
        assert!((canvas.coverage(6, 1) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_circle_center_and_outside() {
        let mut canvas = Canvas::new(20).unwrap();
        canvas.fill(&Shape::Circle { cx: 10.0, cy: 10.0, radius: 4.0 });
        assert_eq!(canvas.coverage(10, 10), 1.0);
        assert_eq!(canvas.coverage(0, 0), 0.0);
        // Corner of the bounding box is outside the circle.
        assert_eq!(canvas.coverage(6, 6), 0.0);
        // Edge pixels are partially covered.
        let edge = canvas.coverage(13, 10);
        assert!(edge > 0.0 && edge <= 1.0);
    }

    #[test]
    fn test_rounded_square_softens_corners() {
        let mut canvas = Canvas::new(20).unwrap();
        canvas.fill(&Shape::RoundedSquare { x: 0.0, y: 0.0, side: 20.0, radii: [6.0; 4] });
        assert_eq!(canvas.coverage(10, 10), 1.0);
        assert_eq!(canvas.coverage(10, 0), 1.0);
        assert!(canvas.coverage(0, 0) < 0.5);
        assert!(canvas.coverage(19, 19) < 0.5);
    }

    #[test]
    fn test_rounded_square_keeps_square_corners() {
        let mut canvas = Canvas::new(20).unwrap();
        canvas.fill(&Shape::RoundedSquare { x: 0.0, y: 0.0, side: 20.0, radii: [6.0, 0.0, 0.0, 0.0] });
        assert!(canvas.coverage(0, 0) < 0.5);
        assert_eq!(canvas.coverage(19, 0), 1.0);
        assert_eq!(canvas.coverage(19, 19), 1.0);
        assert_eq!(canvas.coverage(0, 19), 1.0);
    }

    #[test]
    fn test_square_edge_meets_rounded_neighbour_without_gap() {
        let mut canvas = Canvas::new(20).unwrap();
        canvas.fill(&Shape::RoundedSquare { x: 0.0, y: 0.0, side: 7.5, radii: [2.0, 0.0, 0.0, 2.0] });
        canvas.fill(&Shape::Square { x: 7.5, y: 0.0, side: 7.5 });
        // Pixel 7 straddles the shared edge and is split between both cells.
        assert!((canvas.coverage(7, 3) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shapes_clip_to_surface() {
        let mut canvas = Canvas::new(4).unwrap();
        canvas.fill(&Shape::Circle { cx: -10.0, cy: -10.0, radius: 2.0 });
        canvas.fill(&Shape::Square { x: 3.0, y: 3.0, side: 5.0 });
        assert_eq!(canvas.coverage(3, 3), 1.0);
        assert_eq!(canvas.coverage(0, 0), 0.0);
    }

    #[test]
    fn test_composite_mixes_colors() {
        let mut canvas = Canvas::new(2).unwrap();
        canvas.fill(&Shape::Square { x: 0.0, y: 0.0, side: 1.0 });
        canvas.fill(&Shape::Square { x: 1.0, y: 0.0, side: 0.5 });
        let img = canvas.composite(Color::BLACK, Color::WHITE).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [255, 255, 255, 255]);
        // Half coverage rounds to the midpoint.
        assert_eq!(img.get_pixel(1, 0).0, [128, 128, 128, 255]);
    }
}
