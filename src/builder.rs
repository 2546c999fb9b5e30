//! Tree builder for flexible configuration.
//!
//! Everything the selection and search passes depend on (objective,
//! renderer, error metric, tuning knobs) is fixed at construction time
//! through this builder; nothing is tuned through globals.

use crate::error::Result;
use crate::render::{SnapL1Error, SnapRenderer};
use crate::select::Objective;
use crate::tree::RaQuadTree;
use crate::types::Config;
#[cfg(feature = "snapshot")]
use std::path::PathBuf;

/// Builder for a [`RaQuadTree`].
///
/// # Example
///
/// ```rust
/// use raquad::{Config, Objective, TreeBuilder};
/// use raquad::render::{DiscRenderer, L2Error};
///
/// let tree = TreeBuilder::new()
///     .config(Config::default().with_max_zoom(12))
///     .objective(Objective::render(DiscRenderer::new(1), L2Error))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    config: Config,
    objective: Option<Objective>,
    #[cfg(feature = "snapshot")]
    snapshot_path: Option<PathBuf>,
}

impl TreeBuilder {
    /// Create a builder with the default configuration and the binary
    /// snap objective.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            objective: None,
            #[cfg(feature = "snapshot")]
            snapshot_path: None,
        }
    }

    /// Set the tree configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the sample-selection objective. Defaults to the snap renderer
    /// with the L1 bit metric.
    pub fn objective(mut self, objective: Objective) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Load the tree from a snapshot file instead of starting empty. The
    /// file must have been written by a tree with the same configuration
    /// and objective.
    #[cfg(feature = "snapshot")]
    pub fn snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Build the tree, validating the configuration.
    pub fn build(self) -> Result<RaQuadTree> {
        let objective = self
            .objective
            .unwrap_or_else(|| Objective::render(SnapRenderer, SnapL1Error));

        #[cfg(feature = "snapshot")]
        if let Some(path) = self.snapshot_path {
            return RaQuadTree::load_from_path(path, self.config, objective);
        }

        RaQuadTree::new(self.config, objective)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build() {
        let tree = TreeBuilder::new().build().unwrap();
        assert!(!tree.is_finalized());
        assert_eq!(tree.config().max_zoom, 18);
    }

    #[test]
    fn test_invalid_config_fails() {
        let result = TreeBuilder::new()
            .config(Config::default().with_max_zoom(40))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_centroid_objective() {
        let tree = TreeBuilder::new()
            .objective(Objective::centroid())
            .build()
            .unwrap();
        assert_eq!(tree.objective().error_len(tree.config().max_zoom), 1);
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn test_build_from_snapshot() {
        use crate::types::Point;

        let mut tree = TreeBuilder::new()
            .objective(Objective::centroid())
            .build()
            .unwrap();
        tree.insert(Point::new(0.4, 0.6));
        tree.finalize_samples();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.snapshot");
        tree.save_to_path(&path).unwrap();

        let loaded = TreeBuilder::new()
            .objective(Objective::centroid())
            .snapshot_path(&path)
            .build()
            .unwrap();
        assert!(loaded.is_finalized());
        assert_eq!(loaded.root().sample(), Some(Point::new(0.4, 0.6)));
    }
}
