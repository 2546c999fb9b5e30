//! Rate-adaptive quadtree sampling for map visualization.
//!
//! Answers "show me a representative sample of the points visible in this
//! viewport at this zoom" over large 2D point datasets, under a
//! caller-specified sample budget. Points live in the unit square (use
//! [`mercator`] to project lng/lat); a one-time bottom-up pass picks a
//! representative sample per tree node, and queries run a benefit-driven
//! best-first search that spends the budget where it buys the most visual
//! quality.
//!
//! ```rust
//! use raquad::{BBox, Objective, Point, TreeBuilder};
//!
//! let mut tree = TreeBuilder::new()
//!     .objective(Objective::centroid())
//!     .build()?;
//!
//! tree.insert(Point::new(0.2, 0.4));
//! tree.insert(Point::new(0.7, 0.3));
//! tree.finalize_samples();
//!
//! let result = tree.search(&BBox::unit(), 10, 1000);
//! assert_eq!(result.points.len(), 2);
//! # Ok::<(), raquad::RaquadError>(())
//! ```

pub mod builder;
pub mod error;
pub mod mercator;
pub mod query;
pub mod render;
pub mod select;
pub mod tree;
pub mod types;
pub mod wire;

#[cfg(feature = "snapshot")]
pub mod snapshot;

pub use builder::TreeBuilder;
pub use error::{RaquadError, Result};
pub use query::{SearchResult, SearchStats};
pub use select::Objective;
pub use tree::{QuadNode, RaQuadTree};
pub use types::{BBox, Cell, Config, Point, Quadrant, TreeStats};

pub use render::{
    DiscRenderer, ErrorMetric, L1Error, L2Error, Renderer, SnapL1Error, SnapL2Error, SnapRenderer,
};

pub use wire::MessageBuilder;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Objective, RaQuadTree, RaquadError, Result, TreeBuilder};

    pub use crate::{BBox, Config, Point};

    pub use crate::{SearchResult, SearchStats};

    pub use crate::render::{DiscRenderer, L2Error, SnapL1Error, SnapRenderer};

    pub use crate::mercator;
}
