//! Point and polygon geometry in a caller-chosen CRS.

use super::{Crs, SpatialDomainError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;

const MIN_DISTINCT_VERTICES: usize = 3;

/// A position as `[x, y]`; `[longitude, latitude]` for geographic CRSs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the x coordinate (longitude for geographic CRSs).
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Returns the y coordinate (latitude for geographic CRSs).
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Checks that the point is finite and, for geographic CRSs, in range.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialDomainError::NonFiniteCoordinate`] or
    /// [`SpatialDomainError::CoordinateOutOfRange`].
    pub fn validate(&self, crs: Crs) -> Result<(), SpatialDomainError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(SpatialDomainError::NonFiniteCoordinate);
        }
        if crs.is_geographic()
            && !((-180.0..=180.0).contains(&self.x) && (-90.0..=90.0).contains(&self.y))
        {
            return Err(SpatialDomainError::CoordinateOutOfRange {
                x: self.x,
                y: self.y,
            });
        }
        Ok(())
    }

    fn bits(self) -> (u64, u64) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(value: Point) -> Self {
        [value.x, value.y]
    }
}

/// A simple polygon stored as a closed exterior ring.
///
/// # Examples
///
/// ```
/// use agora::spatial::domain::{Crs, Point, Polygon};
///
/// let square = Polygon::new(
///     vec![
///         Point::new(0.0, 0.0),
///         Point::new(1.0, 0.0),
///         Point::new(1.0, 1.0),
///         Point::new(0.0, 1.0),
///     ],
///     Crs::WGS84,
/// )
/// .expect("valid polygon");
///
/// assert_eq!(square.ring().len(), 5);
/// assert_eq!(square.ring().first(), square.ring().last());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<Point>,
}

impl Polygon {
    /// Builds a polygon from its vertices, closing the ring when needed.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialDomainError::TooFewVertices`] when fewer than three
    /// distinct vertices are given, or a coordinate error for any vertex
    /// invalid in `crs`.
    pub fn new(vertices: Vec<Point>, crs: Crs) -> Result<Self, SpatialDomainError> {
        for vertex in &vertices {
            vertex.validate(crs)?;
        }
        let distinct: BTreeSet<(u64, u64)> = vertices.iter().map(|vertex| vertex.bits()).collect();
        if distinct.len() < MIN_DISTINCT_VERTICES {
            return Err(SpatialDomainError::TooFewVertices);
        }

        let mut ring = vertices;
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied())
            && first != last
        {
            ring.push(first);
        }
        Ok(Self { ring })
    }

    /// Builds the rectangle `[minx, miny, maxx, maxy]`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialDomainError::InvalidBounds`] when a minimum is not
    /// strictly below its maximum.
    pub fn from_bounds(bounds: [f64; 4], crs: Crs) -> Result<Self, SpatialDomainError> {
        let [min_x, min_y, max_x, max_y] = bounds;
        if bounds.iter().any(|value| !value.is_finite()) {
            return Err(SpatialDomainError::NonFiniteCoordinate);
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(SpatialDomainError::InvalidBounds);
        }
        Self::new(
            vec![
                Point::new(min_x, min_y),
                Point::new(max_x, min_y),
                Point::new(max_x, max_y),
                Point::new(min_x, max_y),
            ],
            crs,
        )
    }

    /// Returns the closed exterior ring.
    #[must_use]
    pub fn ring(&self) -> &[Point] {
        &self.ring
    }

    /// Returns whether `point` lies inside the polygon or on its boundary.
    ///
    /// Uses planar even-odd ray casting on raw coordinates.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "ray casting interpolates edge crossings"
    )]
    pub fn contains(&self, point: Point) -> bool {
        let mut inside = false;
        for edge in self.ring.windows(2) {
            let [start, end] = edge else {
                continue;
            };
            if on_segment(*start, *end, point) {
                return true;
            }
            if (start.y > point.y) != (end.y > point.y) {
                let crossing_x =
                    start.x + (point.y - start.y) * (end.x - start.x) / (end.y - start.y);
                if point.x < crossing_x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Renders the polygon as well-known text.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        let mut wkt = String::from("POLYGON((");
        for (index, vertex) in self.ring.iter().enumerate() {
            if index > 0 {
                wkt.push_str(", ");
            }
            let _written = write!(wkt, "{} {}", vertex.x, vertex.y);
        }
        wkt.push_str("))");
        wkt
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "collinearity uses the cross product"
)]
fn on_segment(start: Point, end: Point, point: Point) -> bool {
    let cross = (end.x - start.x) * (point.y - start.y) - (end.y - start.y) * (point.x - start.x);
    cross.abs() <= f64::EPSILON
        && point.x >= start.x.min(end.x)
        && point.x <= start.x.max(end.x)
        && point.y >= start.y.min(end.y)
        && point.y <= start.y.max(end.y)
}
