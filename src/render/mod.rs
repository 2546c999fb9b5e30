//! Rendering oracle used by sample selection.
//!
//! Canvases here are never shown to a user. They exist so two candidate
//! sample sets can be compared for visual similarity: a renderer draws
//! points onto a small synthetic canvas, and an error metric scores the
//! difference between two canvases.
//!
//! Two canvas representations are supported and must be interchangeable
//! under any metric: a dense fixed-resolution grid, and a sparse list of
//! explicitly colored pixels. The sparse form avoids quadratic memory when
//! the implied resolution is large (deep in the tree the resolution grows
//! as `2^(zoom - level + 8)`).

mod disc;
mod metric;
mod snap;

pub use disc::DiscRenderer;
pub use metric::{L1Error, L2Error, SnapL1Error, SnapL2Error};
pub use snap::SnapRenderer;

use crate::types::{Cell, Point};

/// Fill color for rendered points (blue).
pub const POINT_COLOR: [u8; 3] = [0, 0, 255];

/// Canvas background color (light gray).
pub const BG_COLOR: [u8; 3] = [221, 221, 221];

/// Grayscale conversion used by the color metrics.
pub(crate) fn gray(r: u8, g: u8, b: u8) -> i64 {
    (0.3 * f64::from(r) + 0.59 * f64::from(g) + 0.11 * f64::from(b)) as i64
}

/// One explicitly colored pixel of a sparse canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub i: i32,
    pub j: i32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub fn new(i: i32, j: i32, r: u8, g: u8, b: u8) -> Self {
        Self { i, j, r, g, b }
    }

    /// A bare pixel with no color, as produced by the snap renderer.
    pub fn bare(i: i32, j: i32) -> Self {
        Self::new(i, j, 0, 0, 0)
    }
}

/// A dense fixed-resolution canvas.
///
/// The byte layout of `data` is owned by the renderer that created the
/// canvas: the disc renderer stores three RGB bytes per pixel at
/// `(i * side + j) * 3`, the snap renderer one 0/1 byte per pixel at
/// `i * side + j`. A canvas must only be fed back to the renderer family
/// and metric it was created for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseCanvas {
    /// Side length in pixels (the renderer's real resolution).
    pub side: usize,
    pub data: Vec<u8>,
}

/// A sparse canvas: only pixels that differ from the background are listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseCanvas {
    pub pixels: Vec<Pixel>,
}

impl SparseCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Draws single points onto canvases.
///
/// `resolution` is the logical pixel resolution of the cell being rendered;
/// a renderer may pad it (the disc renderer adds a border so discs near the
/// cell edge are not clipped), which is what `real_resolution` reports.
pub trait Renderer {
    /// Allocate a background-filled dense canvas for the given resolution.
    fn create_canvas(&self, resolution: usize) -> DenseCanvas;

    /// Render `point` (which must lie inside `cell`) onto a dense canvas.
    ///
    /// Returns false when the canvas is left unchanged, so a caller can
    /// detect that a point adds no visual information.
    fn render_dense(
        &self,
        canvas: &mut DenseCanvas,
        cell: Cell,
        resolution: usize,
        point: Point,
    ) -> bool;

    /// Render `point` onto a sparse canvas. Same change-reporting contract
    /// as [`Renderer::render_dense`].
    fn render_sparse(
        &self,
        canvas: &mut SparseCanvas,
        cell: Cell,
        resolution: usize,
        point: Point,
    ) -> bool;

    /// Actual side length of a canvas created for `resolution`.
    fn real_resolution(&self, resolution: usize) -> usize;
}

/// Scores the visual difference between two canvases of the same family.
///
/// `error(a, a)` is zero for every canvas `a`.
pub trait ErrorMetric {
    /// Error between two dense canvases with side length `resolution`.
    fn error_dense(&self, a: &DenseCanvas, b: &DenseCanvas, resolution: usize) -> f64;

    /// Error between two sparse canvases implied over a
    /// `resolution x resolution` grid. Pixels present in only one list are
    /// scored against the background.
    fn error_sparse(&self, a: &SparseCanvas, b: &SparseCanvas, resolution: usize) -> f64;
}
