//! Antialiased disc renderer.
//!
//! Mimics how a point layer draws circles: every pixel inside the disc's
//! circumscribed square gets an alpha from a smoothstep ramp across the
//! disc edge, and the point color is composited over the canvas with
//! standard source-over blending.

use rustc_hash::FxHashMap;

use super::{BG_COLOR, DenseCanvas, Pixel, POINT_COLOR, Renderer, SparseCanvas};
use crate::types::{Cell, Point};

/// Half-width in pixels of the antialiasing ramp at the disc edge.
const SMOOTH_EDGE_RADIUS: f64 = 0.5;

/// Renders points as antialiased discs of a fixed pixel radius.
#[derive(Debug, Clone, Copy)]
pub struct DiscRenderer {
    radius_in_pixels: u32,
}

impl DiscRenderer {
    pub fn new(radius_in_pixels: u32) -> Self {
        Self { radius_in_pixels }
    }

    /// Alpha contribution at `distance` pixels from the disc center:
    /// 1 well inside the disc, 0 outside, smoothstep ramp across the edge.
    fn coverage(&self, distance: f64) -> f64 {
        let radius = f64::from(self.radius_in_pixels);
        smoothstep(
            distance - SMOOTH_EDGE_RADIUS,
            distance + SMOOTH_EDGE_RADIUS,
            radius,
        )
    }

    /// Pixel-index bounds of the disc's circumscribed square.
    ///
    /// The canvas is padded by `radius + 1` pixels on each side, so for a
    /// point inside the cell the bounds always land inside the canvas.
    fn disc_bounds(
        &self,
        cell: Cell,
        resolution: usize,
        point: Point,
    ) -> (f64, f64, f64, i64, i64, i64, i64) {
        let radius = f64::from(self.radius_in_pixels);
        let pixel_length = 2.0 * cell.half / resolution as f64;
        let left = cell.cx - cell.half - (radius + 1.0) * pixel_length;
        let top = cell.cy - cell.half - (radius + 1.0) * pixel_length;
        let cs_left = point.x - radius * pixel_length;
        let cs_right = point.x + radius * pixel_length;
        let cs_top = point.y - radius * pixel_length;
        let cs_bottom = point.y + radius * pixel_length;
        let i0 = ((cs_left - left) / pixel_length) as i64;
        let i1 = ((cs_right - left) / pixel_length) as i64;
        let j0 = ((cs_top - top) / pixel_length) as i64;
        let j1 = ((cs_bottom - top) / pixel_length) as i64;
        (pixel_length, left, top, i0, i1, j0, j1)
    }

    /// Blend the point color over an existing RGB value with the alpha for
    /// the pixel centered at `(px, py)`.
    fn blend(&self, point: Point, px: f64, py: f64, pixel_length: f64, dst: [u8; 3]) -> [u8; 3] {
        let distance =
            ((px - point.x).powi(2) + (py - point.y).powi(2)).sqrt() / pixel_length;
        let alpha = self.coverage(distance);
        let mut out = [0u8; 3];
        for k in 0..3 {
            // DST = SRC * alpha + DST * (1 - alpha), truncated per channel
            out[k] =
                (f64::from(POINT_COLOR[k]) * alpha + f64::from(dst[k]) * (1.0 - alpha)) as u8;
        }
        out
    }
}

impl Renderer for DiscRenderer {
    fn create_canvas(&self, resolution: usize) -> DenseCanvas {
        let side = self.real_resolution(resolution);
        let mut data = vec![0u8; side * side * 3];
        for px in data.chunks_exact_mut(3) {
            px.copy_from_slice(&BG_COLOR);
        }
        DenseCanvas { side, data }
    }

    fn render_dense(
        &self,
        canvas: &mut DenseCanvas,
        cell: Cell,
        resolution: usize,
        point: Point,
    ) -> bool {
        let side = canvas.side;
        let (pixel_length, left, top, i0, i1, j0, j1) =
            self.disc_bounds(cell, resolution, point);
        let mut changed = false;
        for i in i0..=i1 {
            for j in j0..=j1 {
                let px = left + (i as f64 + 0.5) * pixel_length;
                let py = top + (j as f64 + 0.5) * pixel_length;
                let idx = (i as usize * side + j as usize) * 3;
                let dst = [canvas.data[idx], canvas.data[idx + 1], canvas.data[idx + 2]];
                let out = self.blend(point, px, py, pixel_length, dst);
                for k in 0..3 {
                    if canvas.data[idx + k] != out[k] {
                        changed = true;
                        canvas.data[idx + k] = out[k];
                    }
                }
            }
        }
        changed
    }

    fn render_sparse(
        &self,
        canvas: &mut SparseCanvas,
        cell: Cell,
        resolution: usize,
        point: Point,
    ) -> bool {
        let mut index: FxHashMap<(i32, i32), usize> = FxHashMap::default();
        for (n, pixel) in canvas.pixels.iter().enumerate() {
            index.insert((pixel.i, pixel.j), n);
        }

        let (pixel_length, left, top, i0, i1, j0, j1) =
            self.disc_bounds(cell, resolution, point);
        let mut changed = false;
        for i in i0..=i1 {
            for j in j0..=j1 {
                let px = left + (i as f64 + 0.5) * pixel_length;
                let py = top + (j as f64 + 0.5) * pixel_length;
                let key = (i as i32, j as i32);
                match index.get(&key) {
                    Some(&n) => {
                        let dst = canvas.pixels[n];
                        let out = self.blend(point, px, py, pixel_length, [dst.r, dst.g, dst.b]);
                        if [dst.r, dst.g, dst.b] != out {
                            changed = true;
                            canvas.pixels[n].r = out[0];
                            canvas.pixels[n].g = out[1];
                            canvas.pixels[n].b = out[2];
                        }
                    }
                    None => {
                        let out = self.blend(point, px, py, pixel_length, BG_COLOR);
                        changed = true;
                        index.insert(key, canvas.pixels.len());
                        canvas
                            .pixels
                            .push(Pixel::new(key.0, key.1, out[0], out[1], out[2]));
                    }
                }
            }
        }
        changed
    }

    fn real_resolution(&self, resolution: usize) -> usize {
        resolution + 2 * (self.radius_in_pixels as usize + 1)
    }
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if x <= edge0 {
        return 0.0;
    }
    if x >= edge1 {
        return 1.0;
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
