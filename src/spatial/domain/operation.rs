//! Agent-facing spatial operations parsed from `spatial.*` envelopes.

use super::{Crs, Point, Polygon, SpatialDomainError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Largest `k` accepted by `spatial.nearestTo`.
pub const MAX_NEAREST_K: u16 = 1000;

const QUERY_REGION: &str = "spatial.queryRegion";
const NEAREST_TO: &str = "spatial.nearestTo";
const WITHIN_DISTANCE: &str = "spatial.withinDistance";

/// A validated spatial operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialOperation {
    /// Rows inside a polygon.
    QueryRegion {
        /// Query area.
        polygon: Polygon,
        /// CRS of the polygon and the result.
        crs: Crs,
    },
    /// The `k` rows closest to a point.
    NearestTo {
        /// Query point.
        point: Point,
        /// CRS of the point and the result.
        crs: Crs,
        /// Number of rows, `1..=1000`.
        k: u16,
    },
    /// Rows within `radius` of a point.
    WithinDistance {
        /// Query point.
        point: Point,
        /// CRS of the point and the result.
        crs: Crs,
        /// Metres for geographic CRSs, CRS units otherwise.
        radius: f64,
    },
}

#[derive(Deserialize)]
struct QueryRegionParams {
    polygon: Option<Vec<Point>>,
    bounds: Option<[f64; 4]>,
    crs: String,
}

#[derive(Deserialize)]
struct NearestToParams {
    point: Point,
    crs: String,
    k: u64,
}

#[derive(Deserialize)]
struct WithinDistanceParams {
    point: Point,
    crs: String,
    radius: f64,
}

fn decode<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, SpatialDomainError> {
    let payload = params.cloned().unwrap_or_else(|| json!({}));
    serde_json::from_value(payload)
        .map_err(|err| SpatialDomainError::InvalidParams(err.to_string()))
}

/// Reads the request's CRS. A blank value is malformed; any other string
/// that is not an EPSG code names a CRS this server does not serve.
fn requested_crs(raw: &str) -> Result<Crs, SpatialDomainError> {
    if raw.trim().is_empty() {
        return Err(SpatialDomainError::InvalidParams(
            "`crs` must not be empty".to_owned(),
        ));
    }
    Crs::parse(raw).map_err(|_| SpatialDomainError::UnsupportedCrs(raw.trim().to_owned()))
}

impl SpatialOperation {
    /// Every method name served by the spatial gateway.
    pub const METHODS: [&'static str; 3] = [QUERY_REGION, NEAREST_TO, WITHIN_DISTANCE];

    /// Parses a `spatial.*` method and its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialDomainError::UnknownOperation`] for unknown methods
    /// and a validation error when the parameters are malformed.
    pub fn parse(method: &str, params: Option<&Value>) -> Result<Self, SpatialDomainError> {
        match method {
            QUERY_REGION => {
                let raw: QueryRegionParams = decode(params)?;
                let crs = requested_crs(&raw.crs)?;
                let polygon = match (raw.polygon, raw.bounds) {
                    (Some(vertices), None) => Polygon::new(vertices, crs)?,
                    (None, Some(bounds)) => Polygon::from_bounds(bounds, crs)?,
                    _ => {
                        return Err(SpatialDomainError::InvalidParams(
                            "exactly one of `polygon` or `bounds` is required".to_owned(),
                        ));
                    }
                };
                Ok(Self::QueryRegion { polygon, crs })
            }
            NEAREST_TO => {
                let raw: NearestToParams = decode(params)?;
                let crs = requested_crs(&raw.crs)?;
                raw.point.validate(crs)?;
                let k = u16::try_from(raw.k)
                    .ok()
                    .filter(|value| (1..=MAX_NEAREST_K).contains(value))
                    .ok_or(SpatialDomainError::InvalidK(raw.k))?;
                Ok(Self::NearestTo {
                    point: raw.point,
                    crs,
                    k,
                })
            }
            WITHIN_DISTANCE => {
                let raw: WithinDistanceParams = decode(params)?;
                let crs = requested_crs(&raw.crs)?;
                raw.point.validate(crs)?;
                if !raw.radius.is_finite() || raw.radius <= 0.0 {
                    return Err(SpatialDomainError::InvalidRadius);
                }
                Ok(Self::WithinDistance {
                    point: raw.point,
                    crs,
                    radius: raw.radius,
                })
            }
            other => Err(SpatialDomainError::UnknownOperation(other.to_owned())),
        }
    }

    /// Returns the method name of the operation.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::QueryRegion { .. } => QUERY_REGION,
            Self::NearestTo { .. } => NEAREST_TO,
            Self::WithinDistance { .. } => WITHIN_DISTANCE,
        }
    }

    /// Returns the CRS the caller asked for.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        match self {
            Self::QueryRegion { crs, .. }
            | Self::NearestTo { crs, .. }
            | Self::WithinDistance { crs, .. } => *crs,
        }
    }
}
