//! Error types for spatial domain validation.

use thiserror::Error;

/// Errors returned while parsing spatial operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SpatialDomainError {
    /// The method names no spatial operation.
    #[error("unknown spatial operation: {0}")]
    UnknownOperation(String),

    /// The parameters do not match the operation's shape.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The CRS is not written as `EPSG:<srid>`.
    #[error("crs must be written as EPSG:<srid>, got '{0}'")]
    MalformedCrs(String),

    /// The CRS names a reference system outside the EPSG registry.
    #[error("unsupported crs: {0}")]
    UnsupportedCrs(String),

    /// A coordinate is NaN or infinite.
    #[error("coordinates must be finite numbers")]
    NonFiniteCoordinate,

    /// A geographic coordinate lies outside the valid range.
    #[error("coordinate [{x}, {y}] is outside longitude [-180, 180] / latitude [-90, 90]")]
    CoordinateOutOfRange {
        /// Longitude.
        x: f64,
        /// Latitude.
        y: f64,
    },

    /// The polygon has fewer than three distinct vertices.
    #[error("polygon needs at least three distinct vertices")]
    TooFewVertices,

    /// The bounds are inverted or empty.
    #[error("bounds must be [minx, miny, maxx, maxy] with min < max")]
    InvalidBounds,

    /// `k` is outside `1..=1000`.
    #[error("k must be between 1 and 1000, got {0}")]
    InvalidK(u64),

    /// The radius is not a positive finite number.
    #[error("radius must be a positive number")]
    InvalidRadius,
}
