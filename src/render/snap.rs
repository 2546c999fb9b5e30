//! Binary "snap" renderer.
//!
//! The cheapest possible visual oracle: a point sets exactly one bit, the
//! one for the pixel containing it. No blending, no antialiasing. Rendering
//! is idempotent by construction, which makes the change flag a precise
//! "this point added information" signal.

use rustc_hash::FxHashMap;

use super::{DenseCanvas, Pixel, Renderer, SparseCanvas};
use crate::types::{Cell, Point};

/// Renders a point as a single set bit in a `resolution x resolution`
/// bitmap (one byte per pixel in the dense form).
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapRenderer;

impl SnapRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Pixel index of the point within the cell's grid.
    fn pixel_of(cell: Cell, resolution: usize, point: Point) -> (i32, i32) {
        let pixel_length = 2.0 * cell.half / resolution as f64;
        let left = cell.cx - cell.half;
        let top = cell.cy - cell.half;
        let i = ((point.x - left) / pixel_length) as i32;
        let j = ((point.y - top) / pixel_length) as i32;
        (i, j)
    }
}

impl Renderer for SnapRenderer {
    fn create_canvas(&self, resolution: usize) -> DenseCanvas {
        DenseCanvas {
            side: resolution,
            data: vec![0u8; resolution * resolution],
        }
    }

    fn render_dense(
        &self,
        canvas: &mut DenseCanvas,
        cell: Cell,
        resolution: usize,
        point: Point,
    ) -> bool {
        let (i, j) = Self::pixel_of(cell, resolution, point);
        let idx = i as usize * canvas.side + j as usize;
        if canvas.data[idx] == 0 {
            canvas.data[idx] = 1;
            return true;
        }
        false
    }

    fn render_sparse(
        &self,
        canvas: &mut SparseCanvas,
        cell: Cell,
        resolution: usize,
        point: Point,
    ) -> bool {
        let mut index: FxHashMap<(i32, i32), ()> = FxHashMap::default();
        for pixel in &canvas.pixels {
            index.insert((pixel.i, pixel.j), ());
        }

        let (i, j) = Self::pixel_of(cell, resolution, point);
        if !index.contains_key(&(i, j)) {
            canvas.pixels.push(Pixel::bare(i, j));
            return true;
        }
        false
    }

    fn real_resolution(&self, resolution: usize) -> usize {
        resolution
    }
}
