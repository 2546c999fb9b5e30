//! Error metrics over canvases.
//!
//! `L1Error`/`L2Error` compare RGB canvases in grayscale and pair with the
//! disc renderer; `SnapL1Error`/`SnapL2Error` compare bitmaps and pair with
//! the snap renderer. All four share the sparse-canvas strategy: build a
//! lookup from the longer pixel list, match-and-remove against the shorter,
//! then account the leftovers as mismatches against the background.

use rustc_hash::FxHashMap;

use super::{BG_COLOR, DenseCanvas, ErrorMetric, Pixel, SparseCanvas, gray};

/// Sum of absolute grayscale differences.
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Error;

/// Sum of squared grayscale differences.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Error;

/// Sum of absolute bit differences between snap bitmaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapL1Error;

/// Sum of squared bit differences between snap bitmaps. For 0/1 bits this
/// coincides with [`SnapL1Error`]; both exist so either norm can be named
/// in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapL2Error;

fn gray_error_dense(a: &DenseCanvas, b: &DenseCanvas, resolution: usize, squared: bool) -> f64 {
    let side = resolution;
    let mut error = 0.0;
    for i in 0..side {
        for j in 0..side {
            let idx = (i * side + j) * 3;
            let gray1 = gray(a.data[idx], a.data[idx + 1], a.data[idx + 2]);
            let gray2 = gray(b.data[idx], b.data[idx + 1], b.data[idx + 2]);
            let diff = (gray1 - gray2).abs() as f64;
            error += if squared { diff * diff } else { diff };
        }
    }
    error
}

fn gray_error_sparse(a: &SparseCanvas, b: &SparseCanvas, squared: bool) -> f64 {
    let (longer, shorter) = if a.len() > b.len() { (a, b) } else { (b, a) };

    let mut longer_map: FxHashMap<(i32, i32), Pixel> = FxHashMap::default();
    for pixel in &longer.pixels {
        longer_map.insert((pixel.i, pixel.j), *pixel);
    }

    let bg = gray(BG_COLOR[0], BG_COLOR[1], BG_COLOR[2]);
    let mut error = 0.0;

    // Pixels in the shorter list: matched against the longer list where
    // possible, otherwise against the background.
    for pixel in &shorter.pixels {
        let gray1 = gray(pixel.r, pixel.g, pixel.b);
        let gray2 = match longer_map.remove(&(pixel.i, pixel.j)) {
            Some(other) => gray(other.r, other.g, other.b),
            None => bg,
        };
        let diff = (gray1 - gray2).abs() as f64;
        error += if squared { diff * diff } else { diff };
    }

    // Leftover pixels of the longer list have no counterpart: background.
    for pixel in longer_map.values() {
        let diff = (gray(pixel.r, pixel.g, pixel.b) - bg).abs() as f64;
        error += if squared { diff * diff } else { diff };
    }

    error
}

fn bit_error_dense(a: &DenseCanvas, b: &DenseCanvas, resolution: usize) -> f64 {
    let side = resolution;
    let mut error = 0.0;
    for idx in 0..side * side {
        // Squared and absolute coincide for 0/1 bits.
        let diff = i16::from(a.data[idx]) - i16::from(b.data[idx]);
        error += f64::from(diff * diff);
    }
    error
}

fn bit_error_sparse(a: &SparseCanvas, b: &SparseCanvas) -> f64 {
    let (longer, shorter) = if a.len() > b.len() { (a, b) } else { (b, a) };

    let mut longer_map: FxHashMap<(i32, i32), ()> = FxHashMap::default();
    for pixel in &longer.pixels {
        longer_map.insert((pixel.i, pixel.j), ());
    }

    // A pixel present in both bitmaps contributes zero; present in exactly
    // one, it mismatches the background bit on the other side.
    let mut error = 0.0;
    for pixel in &shorter.pixels {
        if longer_map.remove(&(pixel.i, pixel.j)).is_none() {
            error += 1.0;
        }
    }
    error + longer_map.len() as f64
}

impl ErrorMetric for L1Error {
    fn error_dense(&self, a: &DenseCanvas, b: &DenseCanvas, resolution: usize) -> f64 {
        gray_error_dense(a, b, resolution, false)
    }

    fn error_sparse(&self, a: &SparseCanvas, b: &SparseCanvas, _resolution: usize) -> f64 {
        gray_error_sparse(a, b, false)
    }
}

impl ErrorMetric for L2Error {
    fn error_dense(&self, a: &DenseCanvas, b: &DenseCanvas, resolution: usize) -> f64 {
        gray_error_dense(a, b, resolution, true)
    }

    fn error_sparse(&self, a: &SparseCanvas, b: &SparseCanvas, _resolution: usize) -> f64 {
        gray_error_sparse(a, b, true)
    }
}

impl ErrorMetric for SnapL1Error {
    fn error_dense(&self, a: &DenseCanvas, b: &DenseCanvas, resolution: usize) -> f64 {
        bit_error_dense(a, b, resolution)
    }

    fn error_sparse(&self, a: &SparseCanvas, b: &SparseCanvas, _resolution: usize) -> f64 {
        bit_error_sparse(a, b)
    }
}

impl ErrorMetric for SnapL2Error {
    fn error_dense(&self, a: &DenseCanvas, b: &DenseCanvas, resolution: usize) -> f64 {
        bit_error_dense(a, b, resolution)
    }

    fn error_sparse(&self, a: &SparseCanvas, b: &SparseCanvas, _resolution: usize) -> f64 {
        bit_error_sparse(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DiscRenderer, Renderer, SnapRenderer};
    use crate::types::{Cell, Point};

    #[test]
    fn test_error_is_reflexive_dense() {
        let renderer = DiscRenderer::new(1);
        let mut canvas = renderer.create_canvas(8);
        renderer.render_dense(&mut canvas, Cell::ROOT, 8, Point::new(0.4, 0.4));
        let real = renderer.real_resolution(8);

        assert_eq!(L1Error.error_dense(&canvas, &canvas, real), 0.0);
        assert_eq!(L2Error.error_dense(&canvas, &canvas, real), 0.0);
    }

    #[test]
    fn test_error_is_reflexive_sparse() {
        let renderer = SnapRenderer::new();
        let mut canvas = SparseCanvas::new();
        renderer.render_sparse(&mut canvas, Cell::ROOT, 16, Point::new(0.9, 0.2));

        assert_eq!(SnapL1Error.error_sparse(&canvas, &canvas, 16), 0.0);
        assert_eq!(SnapL2Error.error_sparse(&canvas, &canvas, 16), 0.0);
    }

    #[test]
    fn test_snap_error_counts_differing_bits() {
        let renderer = SnapRenderer::new();
        let mut a = renderer.create_canvas(4);
        let mut b = renderer.create_canvas(4);
        renderer.render_dense(&mut a, Cell::ROOT, 4, Point::new(0.1, 0.1));
        renderer.render_dense(&mut b, Cell::ROOT, 4, Point::new(0.9, 0.9));

        assert_eq!(SnapL1Error.error_dense(&a, &b, 4), 2.0);
    }

    #[test]
    fn test_sparse_leftovers_count_against_background() {
        let mut a = SparseCanvas::new();
        a.pixels.push(Pixel::bare(0, 0));
        a.pixels.push(Pixel::bare(1, 1));
        let mut b = SparseCanvas::new();
        b.pixels.push(Pixel::bare(0, 0));

        // One shared pixel, one unmatched: a single bit of error either
        // way the arguments are ordered.
        assert_eq!(SnapL1Error.error_sparse(&a, &b, 4), 1.0);
        assert_eq!(SnapL1Error.error_sparse(&b, &a, 4), 1.0);
    }

    #[test]
    fn test_dense_and_sparse_agree_for_snap() {
        let renderer = SnapRenderer::new();
        let points = [Point::new(0.1, 0.1), Point::new(0.7, 0.3)];
        let other = [Point::new(0.1, 0.1), Point::new(0.3, 0.8)];

        let mut dense_a = renderer.create_canvas(8);
        let mut dense_b = renderer.create_canvas(8);
        let mut sparse_a = SparseCanvas::new();
        let mut sparse_b = SparseCanvas::new();
        for p in points {
            renderer.render_dense(&mut dense_a, Cell::ROOT, 8, p);
            renderer.render_sparse(&mut sparse_a, Cell::ROOT, 8, p);
        }
        for p in other {
            renderer.render_dense(&mut dense_b, Cell::ROOT, 8, p);
            renderer.render_sparse(&mut sparse_b, Cell::ROOT, 8, p);
        }

        assert_eq!(
            SnapL2Error.error_dense(&dense_a, &dense_b, 8),
            SnapL2Error.error_sparse(&sparse_a, &sparse_b, 8)
        );
    }
}
