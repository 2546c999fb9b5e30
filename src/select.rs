//! One-time bottom-up sample selection.
//!
//! After loading, every internal node gets a representative sample and a
//! cached error vector. The pass is post-order: children settle their
//! samples first, then the parent judges its options against them. Two
//! judging strategies exist, chosen once at tree construction.

use smallvec::SmallVec;

use crate::render::{ErrorMetric, Renderer, SparseCanvas};
use crate::tree::QuadNode;
use crate::types::{Cell, Config, Point, Quadrant, TILE_SIZE};

/// How a node's representative sample and cached errors are computed.
pub enum Objective {
    /// Render up to four child samples onto a node-local canvas as ground
    /// truth, render each candidate alone, and keep the candidate whose
    /// rendering is visually closest. Errors are cached per zoom level.
    Render {
        renderer: Box<dyn Renderer>,
        metric: Box<dyn ErrorMetric>,
    },
    /// The count-weighted centroid of the child samples becomes the
    /// node's (synthetic) sample; the cached scalar error is the
    /// count-weighted average distance from centroid to children.
    Centroid,
}

impl Objective {
    /// Render-comparison objective with the given renderer and metric.
    pub fn render<R, M>(renderer: R, metric: M) -> Self
    where
        R: Renderer + 'static,
        M: ErrorMetric + 'static,
    {
        Self::Render {
            renderer: Box::new(renderer),
            metric: Box::new(metric),
        }
    }

    /// Centroid-distance objective.
    pub fn centroid() -> Self {
        Self::Centroid
    }

    /// Length of the per-node error vector under this objective.
    pub fn error_len(&self, max_zoom: u32) -> usize {
        match self {
            Self::Render { .. } => max_zoom as usize + 1,
            Self::Centroid => 1,
        }
    }
}

impl std::fmt::Debug for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render { .. } => f.write_str("Objective::Render"),
            Self::Centroid => f.write_str("Objective::Centroid"),
        }
    }
}

/// Child samples visible from a node, with their subtree weights.
type Candidates = SmallVec<[(Point, u64); 4]>;

fn candidates(node: &QuadNode) -> Candidates {
    let mut out = Candidates::new();
    if let Some(children) = &node.children {
        for child in children.iter() {
            if let Some(sample) = child.sample {
                out.push((sample, child.count));
            }
        }
    }
    out
}

/// Post-order selection over the subtree rooted at `node`, whose cell
/// geometry is `cell`. Leaves already carry their best sample.
pub(crate) fn select_node(node: &mut QuadNode, cell: Cell, objective: &Objective, config: &Config) {
    if node.children.is_some() {
        // Children settle first.
        if let Some(children) = node.children.as_mut() {
            for (quadrant, child) in Quadrant::ALL.into_iter().zip(children.iter_mut()) {
                select_node(child, cell.child(quadrant), objective, config);
            }
        }
        match objective {
            Objective::Render { renderer, metric } => {
                select_render(node, cell, renderer.as_ref(), metric.as_ref(), config);
            }
            Objective::Centroid => select_centroid(node),
        }
    }
}

fn select_render(
    node: &mut QuadNode,
    cell: Cell,
    renderer: &dyn Renderer,
    metric: &dyn ErrorMetric,
    config: &Config,
) {
    let options = candidates(node);
    if options.is_empty() {
        node.sample = None;
        node.errors.fill(0.0);
        return;
    }

    // Ground truth: all child samples together on a node-local canvas.
    let resolution = config.node_resolution as usize;
    let real = renderer.real_resolution(resolution);
    let mut truth = renderer.create_canvas(resolution);
    for (sample, _) in &options {
        renderer.render_dense(&mut truth, cell, resolution, *sample);
    }

    // Strictly-smaller wins, so ties keep the earliest candidate in
    // NW, NE, SW, SE order.
    let mut best = None;
    let mut min_error = f64::MAX;
    for (sample, _) in &options {
        let mut alone = renderer.create_canvas(resolution);
        renderer.render_dense(&mut alone, cell, resolution, *sample);
        let error = metric.error_dense(&truth, &alone, real);
        if error < min_error {
            min_error = error;
            best = Some(*sample);
        }
    }
    node.sample = best;

    for zoom in 0..=config.max_zoom {
        let pixel_scale = 1.0 / f64::from(TILE_SIZE) / 2f64.powi(zoom as i32);
        let error = error_against_children(node, cell, pixel_scale, renderer, metric, config);
        node.errors[zoom as usize] = error;
    }
}

/// Error between this node's chosen sample and its children's samples when
/// the cell is drawn `cell_extent / pixel_scale` pixels wide.
fn error_against_children(
    node: &QuadNode,
    cell: Cell,
    pixel_scale: f64,
    renderer: &dyn Renderer,
    metric: &dyn ErrorMetric,
    config: &Config,
) -> f64 {
    let resolution = (2.0 * cell.half / pixel_scale).round() as usize;
    // The node is smaller than one pixel at this scale.
    if resolution == 0 {
        return 0.0;
    }

    let real = renderer.real_resolution(resolution);

    // Large canvases with at most five samples on them are cheaper as
    // pixel lists.
    if resolution > 4 * config.node_sample_size as usize {
        let mut alone = SparseCanvas::new();
        if let Some(sample) = node.sample {
            renderer.render_sparse(&mut alone, cell, resolution, sample);
        }
        let mut truth = SparseCanvas::new();
        for (sample, _) in candidates(node) {
            renderer.render_sparse(&mut truth, cell, resolution, sample);
        }
        metric.error_sparse(&alone, &truth, real)
    } else {
        let mut alone = renderer.create_canvas(resolution);
        if let Some(sample) = node.sample {
            renderer.render_dense(&mut alone, cell, resolution, sample);
        }
        let mut truth = renderer.create_canvas(resolution);
        for (sample, _) in candidates(node) {
            renderer.render_dense(&mut truth, cell, resolution, sample);
        }
        metric.error_dense(&alone, &truth, real)
    }
}

fn select_centroid(node: &mut QuadNode) {
    let options = candidates(node);
    let sum_count: u64 = options.iter().map(|(_, c)| c).sum();
    if sum_count == 0 {
        node.sample = None;
        node.errors[0] = 0.0;
        return;
    }

    let total = sum_count as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for (sample, count) in &options {
        sum_x += *count as f64 * sample.x;
        sum_y += *count as f64 * sample.y;
    }
    let centroid = Point::new(sum_x / total, sum_y / total);

    let mut sum_distance = 0.0;
    for (sample, count) in &options {
        sum_distance += *count as f64 * sample.distance_to(&centroid);
    }

    node.sample = Some(centroid);
    node.errors[0] = sum_distance / total;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{SnapL1Error, SnapRenderer};
    use crate::tree::RaQuadTree;

    fn corners() -> [Point; 4] {
        [
            Point::new(0.25, 0.25),
            Point::new(0.75, 0.25),
            Point::new(0.25, 0.75),
            Point::new(0.75, 0.75),
        ]
    }

    #[test]
    fn test_render_tie_break_keeps_north_west() {
        // Four points, one per root quadrant, fully symmetric: every
        // candidate scores the same error, so the NW one must win.
        let objective = Objective::render(SnapRenderer, SnapL1Error);
        let mut tree = RaQuadTree::new(Config::default(), objective).unwrap();
        for p in corners() {
            tree.insert(p);
        }
        tree.finalize_samples();
        assert_eq!(tree.root().sample(), Some(Point::new(0.25, 0.25)));
    }

    #[test]
    fn test_centroid_of_symmetric_corners() {
        let mut tree = RaQuadTree::new(Config::default(), Objective::centroid()).unwrap();
        for p in corners() {
            tree.insert(p);
        }
        tree.finalize_samples();
        let center = Point::new(0.5, 0.5);
        assert_eq!(tree.root().sample(), Some(center));
        // Scalar error is the mean distance from the centroid to the
        // four (equidistant) corners.
        let expected = corners()[0].distance_to(&center);
        assert!((tree.root().errors()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let objective = Objective::render(SnapRenderer, SnapL1Error);
        let mut tree = RaQuadTree::new(Config::default().with_max_zoom(4), objective).unwrap();
        let mut x = 0.618f64;
        for _ in 0..200 {
            x = (x * 997.0).fract();
            let y = (x * 613.0).fract();
            tree.insert(Point::new(x, y));
        }
        tree.finalize_samples();
        let first = tree.root().clone();
        tree.finalize_samples();
        assert_eq!(tree.root(), &first);
    }

    #[test]
    fn test_error_len_by_objective() {
        assert_eq!(Objective::centroid().error_len(18), 1);
        assert_eq!(
            Objective::render(SnapRenderer, SnapL1Error).error_len(18),
            19
        );
    }

    #[test]
    fn test_leaf_keeps_its_own_sample() {
        let mut tree = RaQuadTree::new(Config::default(), Objective::centroid()).unwrap();
        tree.insert(Point::new(0.3, 0.7));
        tree.finalize_samples();
        assert_eq!(tree.root().sample(), Some(Point::new(0.3, 0.7)));
    }
}
