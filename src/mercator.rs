//! Web-Mercator projection between lng/lat and the unit square.
//!
//! The tree works purely in `[0,1)^2`; these helpers map geographic
//! coordinates onto that plane with y growing southward:
//!
//! ```text
//!              ^ 90                   0 ----------------> 1
//!              |                      |
//! -180 --------+--------> 180  ==>    |
//!              |                      |
//!              |-90                   v 1
//! ```

use std::f64::consts::PI;

use crate::types::Point;

/// Longitude in degrees to x in `[0, 1]`.
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude in degrees to y in `[0, 1]`, clamped at the poles where the
/// projection diverges.
pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// x in `[0, 1]` back to longitude in degrees.
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// y in `[0, 1]` back to latitude in degrees.
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Project a lng/lat [`geo::Point`] onto the unit square.
pub fn project(point: geo::Point<f64>) -> Point {
    Point::new(lng_x(point.x()), lat_y(point.y()))
}

/// Unproject a unit-square point back to a lng/lat [`geo::Point`].
pub fn unproject(point: Point) -> geo::Point<f64> {
    geo::Point::new(x_lng(point.x), y_lat(point.y))
}
