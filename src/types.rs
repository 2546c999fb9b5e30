//! Core value types and configuration.
//!
//! Points live in the normalized unit square `[0,1) x [0,1)` (y grows
//! downward, matching the Web-Mercator convention used by map tiles).
//! Configuration is serializable and loadable from JSON or TOML while
//! keeping complexity minimal.

use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Side length in pixels of one base-map tile. Zoom level `z` implies a
/// pixel scale of `1 / TILE_SIZE / 2^z` in unit-square coordinates.
pub const TILE_SIZE: u32 = 256;

/// Tree level at which one node covers one pixel of the zoom-0 tile
/// (`2^8 == TILE_SIZE`). Levels above this are always worth expanding.
pub const BASE_LEVEL: u32 = TILE_SIZE.ilog2();

/// A 2D point in the unit square. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point. Coordinates are expected in `[0,1)`.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// The four quadrants of a cell, in the fixed traversal order used
/// everywhere in this crate: NW, NE, SW, SE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    /// All quadrants in traversal order.
    pub const ALL: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];
}

/// The square region owned by a quadtree node.
///
/// Cells are never stored in the tree; they are derived from the root cell
/// and the path of quadrant choices taken to reach a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Center x coordinate.
    pub cx: f64,
    /// Center y coordinate.
    pub cy: f64,
    /// Half of the cell's side length.
    pub half: f64,
}

impl Cell {
    /// The root cell covering the whole unit square.
    pub const ROOT: Self = Self {
        cx: 0.5,
        cy: 0.5,
        half: 0.5,
    };

    /// The child cell for the given quadrant, with half the dimension.
    pub fn child(&self, quadrant: Quadrant) -> Self {
        let half = self.half / 2.0;
        let (cx, cy) = match quadrant {
            Quadrant::NorthWest => (self.cx - half, self.cy - half),
            Quadrant::NorthEast => (self.cx + half, self.cy - half),
            Quadrant::SouthWest => (self.cx - half, self.cy + half),
            Quadrant::SouthEast => (self.cx + half, self.cy + half),
        };
        Self { cx, cy, half }
    }

    /// Whether the point falls inside this cell. The cell is half-open:
    /// the left/top edges are inclusive, the right/bottom edges exclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.cx - self.half
            && point.y >= self.cy - self.half
            && point.x < self.cx + self.half
            && point.y < self.cy + self.half
    }

    /// Whether this cell overlaps the query rectangle.
    pub fn intersects(&self, bbox: &BBox) -> bool {
        if bbox.min_x() > self.cx + self.half {
            return false;
        }
        if bbox.max_x() < self.cx - self.half {
            return false;
        }
        if bbox.min_y() > self.cy + self.half {
            return false;
        }
        if bbox.max_y() < self.cy - self.half {
            return false;
        }
        true
    }
}

/// An axis-aligned query rectangle in unit-square coordinates, stored as a
/// center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub cx: f64,
    pub cy: f64,
    pub half_width: f64,
    pub half_height: f64,
}

impl BBox {
    /// Build from min/max corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            cx: (min_x + max_x) / 2.0,
            cy: (min_y + max_y) / 2.0,
            half_width: (max_x - min_x) / 2.0,
            half_height: (max_y - min_y) / 2.0,
        }
    }

    /// The whole unit square.
    pub fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn min_x(&self) -> f64 {
        self.cx - self.half_width
    }

    pub fn max_x(&self) -> f64 {
        self.cx + self.half_width
    }

    pub fn min_y(&self) -> f64 {
        self.cy - self.half_height
    }

    pub fn max_y(&self) -> f64 {
        self.cy + self.half_height
    }
}

/// Tree configuration.
///
/// All former global tuning knobs are explicit here and fixed at
/// construction time.
///
/// # Example
///
/// ```rust
/// use raquad::Config;
///
/// let config = Config::default().with_max_zoom(12);
///
/// let json = r#"{ "max_zoom": 12, "radius_in_pixels": 2 }"#;
/// let config: Config = Config::from_json(json).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Deepest supported map zoom level. Subdivision stops once a cell's
    /// dimension falls below one pixel at this zoom.
    #[serde(default = "Config::default_max_zoom")]
    pub max_zoom: u32,

    /// Disc radius in pixels used by the antialiased renderer.
    #[serde(default = "Config::default_radius_in_pixels")]
    pub radius_in_pixels: u32,

    /// Resolution of the node-local canvas used during sample selection.
    #[serde(default = "Config::default_node_resolution")]
    pub node_resolution: u32,

    /// Budget units charged per emitted sample.
    #[serde(default = "Config::default_node_sample_size")]
    pub node_sample_size: u32,

    /// Budget used when a query passes a non-positive sample budget.
    #[serde(default = "Config::default_sample_budget")]
    pub default_sample_budget: i64,

    /// When true, a point rejected at a full minimum-size cell does not
    /// leave its count increments behind on the descent path. The default
    /// preserves the historical accounting, where `count` on the path grows
    /// even for dropped points.
    #[serde(default)]
    pub strict_insert: bool,
}

impl Config {
    const fn default_max_zoom() -> u32 {
        18
    }

    const fn default_radius_in_pixels() -> u32 {
        1
    }

    const fn default_node_resolution() -> u32 {
        1
    }

    const fn default_node_sample_size() -> u32 {
        1
    }

    const fn default_sample_budget() -> i64 {
        100_000
    }

    pub fn with_max_zoom(mut self, max_zoom: u32) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_radius_in_pixels(mut self, radius: u32) -> Self {
        self.radius_in_pixels = radius;
        self
    }

    pub fn with_node_resolution(mut self, resolution: u32) -> Self {
        self.node_resolution = resolution;
        self
    }

    pub fn with_node_sample_size(mut self, size: u32) -> Self {
        self.node_sample_size = size;
        self
    }

    pub fn with_default_sample_budget(mut self, budget: i64) -> Self {
        self.default_sample_budget = budget;
        self
    }

    pub fn with_strict_insert(mut self, strict: bool) -> Self {
        self.strict_insert = strict;
        self
    }

    /// Smallest cell dimension the tree will subdivide to: one pixel of a
    /// `max_zoom` tile.
    pub fn min_cell_dimension(&self) -> f64 {
        1.0 / f64::from(TILE_SIZE) / 2f64.powi(self.max_zoom as i32)
    }

    /// Deepest level a node can reach, counting the root as level 0.
    ///
    /// A cell at `max_zoom + 8` has exactly the minimum dimension, so it
    /// still subdivides once; its children sit one level below it.
    pub fn max_level(&self) -> u32 {
        self.max_zoom + BASE_LEVEL + 1
    }

    /// Validate configuration values.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_zoom > 26 {
            return Err("max_zoom must be at most 26".to_string());
        }
        if self.node_resolution == 0 {
            return Err("node_resolution must be greater than zero".to_string());
        }
        if self.node_sample_size == 0 {
            return Err("node_sample_size must be greater than zero".to_string());
        }
        if self.default_sample_budget <= 0 {
            return Err("default_sample_budget must be positive".to_string());
        }
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from a TOML string (requires the `toml` feature).
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Self = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a TOML string (requires the `toml` feature).
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_zoom: Self::default_max_zoom(),
            radius_in_pixels: Self::default_radius_in_pixels(),
            node_resolution: Self::default_node_resolution(),
            node_sample_size: Self::default_node_sample_size(),
            default_sample_budget: Self::default_sample_budget(),
            strict_insert: false,
        }
    }
}

/// Ingestion statistics, maintained across `load` calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeStats {
    /// Points offered to the tree.
    pub processed_points: u64,
    /// Points actually stored on a leaf.
    pub stored_points: u64,
    /// Points rejected (out of domain, or colliding at minimum cell size).
    pub skipped_points: u64,
    /// Nodes allocated so far (the root is not counted).
    pub node_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_zoom, 18);
        assert_eq!(config.radius_in_pixels, 1);
        assert_eq!(config.node_resolution, 1);
        assert_eq!(config.node_sample_size, 1);
        assert_eq!(config.default_sample_budget, 100_000);
        assert!(!config.strict_insert);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_max_zoom(12)
            .with_radius_in_pixels(2)
            .with_strict_insert(true);

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.max_zoom = 30;
        assert!(config.validate().is_err());

        config = Config::default();
        config.node_resolution = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.default_sample_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_cell_dimension() {
        let config = Config::default().with_max_zoom(0);
        assert!((config.min_cell_dimension() - 1.0 / 256.0).abs() < 1e-12);

        let config = Config::default().with_max_zoom(18);
        let expected = 1.0 / 256.0 / 2f64.powi(18);
        assert!((config.min_cell_dimension() - expected).abs() < 1e-18);
    }

    #[test]
    fn test_max_level_allows_one_split_past_min_dimension() {
        // A cell at max_zoom + 8 has exactly the minimum dimension and
        // still subdivides, so its children are the deepest nodes.
        assert_eq!(Config::default().with_max_zoom(0).max_level(), 9);
        assert_eq!(Config::default().with_max_zoom(18).max_level(), 27);
    }

    #[test]
    fn test_cell_children_cover_parent() {
        let root = Cell::ROOT;
        let nw = root.child(Quadrant::NorthWest);
        assert_eq!(
            nw,
            Cell {
                cx: 0.25,
                cy: 0.25,
                half: 0.25
            }
        );
        let se = root.child(Quadrant::SouthEast);
        assert_eq!(
            se,
            Cell {
                cx: 0.75,
                cy: 0.75,
                half: 0.25
            }
        );

        // Every quadrant contains its own center and nothing else's.
        for q in Quadrant::ALL {
            let child = root.child(q);
            assert!(child.contains(Point::new(child.cx, child.cy)));
            for other in Quadrant::ALL {
                if other != q {
                    let sibling = root.child(other);
                    assert!(!sibling.contains(Point::new(child.cx, child.cy)));
                }
            }
        }
    }

    #[test]
    fn test_cell_half_open_edges() {
        let cell = Cell {
            cx: 0.25,
            cy: 0.25,
            half: 0.25,
        };
        assert!(cell.contains(Point::new(0.0, 0.0)));
        assert!(!cell.contains(Point::new(0.5, 0.25)));
        assert!(!cell.contains(Point::new(0.25, 0.5)));
    }

    #[test]
    fn test_bbox_intersection() {
        let cell = Cell {
            cx: 0.25,
            cy: 0.25,
            half: 0.25,
        };
        assert!(cell.intersects(&BBox::new(0.4, 0.4, 0.6, 0.6)));
        assert!(!cell.intersects(&BBox::new(0.6, 0.6, 0.9, 0.9)));
        // Touching edges count as intersecting.
        assert!(cell.intersects(&BBox::new(0.5, 0.0, 0.9, 0.5)));
    }
}
