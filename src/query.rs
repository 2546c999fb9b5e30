//! Benefit-driven best-first range search under a sample budget.
//!
//! The search walks the tree from the root, always expanding the frontier
//! node whose expansion is estimated to buy the most visual quality per
//! budget unit spent. When the frontier's best benefit drops to zero or
//! the budget runs out, remaining frontier nodes emit their samples as-is.

use std::collections::BinaryHeap;
use std::time::Instant;

use crate::select::{Objective, select_node};
use crate::tree::{QuadNode, RaQuadTree};
use crate::types::{BASE_LEVEL, BBox, Cell, Config, Point, Quadrant};

/// Counters for a single [`RaQuadTree::search`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStats {
    /// How many benefit estimates this query computed.
    pub benefit_calls: u64,
    /// How many frontier nodes emitted their sample, indexed by tree level.
    pub nodes_stopped_at_level: Vec<u64>,
}

impl SearchStats {
    fn new(levels: usize) -> Self {
        Self {
            benefit_calls: 0,
            nodes_stopped_at_level: vec![0; levels],
        }
    }

    /// Total number of emitted frontier nodes.
    pub fn nodes_stopped(&self) -> u64 {
        self.nodes_stopped_at_level.iter().sum()
    }
}

/// Samples found by a search, plus per-call counters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Representative samples, in no particular order.
    pub points: Vec<Point>,
    pub stats: SearchStats,
}

/// Estimated quality gain per budget unit for expanding `node` into its
/// children, when the viewer is at `zoom`.
///
/// Leaves cannot be expanded (0). Nodes above the base tile resolution
/// (level < 8) are always worth expanding (+infinity). Cost is the net
/// change in emitted samples; a free expansion is infinitely beneficial.
pub(crate) fn benefit(node: &QuadNode, level: u32, zoom: u32, objective: &Objective) -> f64 {
    if node.is_leaf() {
        return 0.0;
    }
    if level < BASE_LEVEL {
        return f64::INFINITY;
    }

    let gain = match objective {
        Objective::Render { .. } => node.errors[zoom as usize] * (node.count as f64).ln(),
        Objective::Centroid => {
            // At one pixel or less per node the viewer cannot tell the
            // difference; let coarser nodes spend the budget.
            if level >= zoom + BASE_LEVEL {
                return 0.0;
            }
            let resolution = 2f64.powi((zoom + BASE_LEVEL - level) as i32);
            let child_resolution = (resolution / 2.0).max(1.0);
            let error = node.errors[0] * resolution * resolution;
            let sum_children: f64 = Quadrant::ALL
                .into_iter()
                .filter_map(|q| node.child(q))
                .map(|c| c.errors[0])
                .sum();
            error - (sum_children * child_resolution * child_resolution) / 4.0
        }
    };

    let own = i64::from(node.sample.is_some());
    let cost = i64::from(node.sampled_children()) - own;
    if cost == 0 {
        f64::INFINITY
    } else {
        gain / cost as f64
    }
}

/// A frontier node awaiting expansion, ordered by benefit.
struct QEntry<'a> {
    level: u32,
    cell: Cell,
    node: &'a QuadNode,
    benefit: f64,
}

impl PartialEq for QEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.benefit.total_cmp(&other.benefit).is_eq()
    }
}

impl Eq for QEntry<'_> {}

impl PartialOrd for QEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QEntry<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.benefit.total_cmp(&other.benefit)
    }
}

fn best_first(
    root: &QuadNode,
    config: &Config,
    objective: &Objective,
    bbox: &BBox,
    zoom: u32,
    budget: i64,
) -> SearchResult {
    let levels = config.max_level() as usize + 1;
    let mut stats = SearchStats::new(levels);
    let mut points = Vec::new();

    let unit = i64::from(config.node_sample_size);
    let mut available = budget - unit;

    let mut heap = BinaryHeap::new();
    stats.benefit_calls += 1;
    heap.push(QEntry {
        level: 0,
        cell: Cell::ROOT,
        node: root,
        benefit: benefit(root, 0, zoom, objective),
    });

    while let Some(entry) = heap.pop() {
        // Collecting mode: nothing left worth expanding, or no budget to
        // expand with. The frontier node contributes its own sample.
        if entry.benefit <= 0.0 || available <= 0 {
            if let Some(sample) = entry.node.sample {
                stats.nodes_stopped_at_level[entry.level as usize] += 1;
                points.push(sample);
            }
            continue;
        }

        // Expanding trades this node's one sample for its children's.
        if entry.node.sample.is_some() {
            available += unit;
        }
        if let Some(children) = &entry.node.children {
            for (quadrant, child) in Quadrant::ALL.into_iter().zip(children.iter()) {
                let child_cell = entry.cell.child(quadrant);
                if !child_cell.intersects(bbox) {
                    continue;
                }
                stats.benefit_calls += 1;
                heap.push(QEntry {
                    level: entry.level + 1,
                    cell: child_cell,
                    node: child,
                    benefit: benefit(child, entry.level + 1, zoom, objective),
                });
                if child.sample.is_some() {
                    available -= unit;
                }
            }
        }
    }

    SearchResult { points, stats }
}

impl RaQuadTree {
    /// Representative samples inside `bbox` for a viewer at `zoom`,
    /// spending roughly `budget` sample units.
    ///
    /// The result size approximates the budget; a pushed child that ends
    /// up cheaper than its parent can leave a small overshoot. A
    /// non-positive budget falls back to
    /// [`Config::default_sample_budget`]. If the tree has not been
    /// finalized yet, a one-off selection pass runs first so partial
    /// loads still answer progressively.
    pub fn search(&mut self, bbox: &BBox, zoom: u32, budget: i64) -> SearchResult {
        if !self.finalized {
            log::warn!("search before finalize_samples, running one-off sample selection");
            let started = Instant::now();
            select_node(&mut self.root, Cell::ROOT, &self.objective, &self.config);
            log::info!("one-off sample selection finished in {:?}", started.elapsed());
        }

        let budget = if budget <= 0 {
            self.config.default_sample_budget
        } else {
            budget
        };
        let zoom = zoom.min(self.config.max_zoom);

        let started = Instant::now();
        let result = best_first(&self.root, &self.config, &self.objective, bbox, zoom, budget);
        log::debug!(
            "search bbox=({:.6},{:.6})..({:.6},{:.6}) zoom={} budget={}: {} points, {} benefit calls in {:?}",
            bbox.min_x(),
            bbox.min_y(),
            bbox.max_x(),
            bbox.max_y(),
            zoom,
            budget,
            result.points.len(),
            result.stats.benefit_calls,
            started.elapsed(),
        );
        result
    }
}
