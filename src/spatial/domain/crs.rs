//! Coordinate reference system identifiers.

use super::SpatialDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

const EPSG_PREFIX: &str = "EPSG:";
const WGS84_SRID: i32 = 4326;

/// An `EPSG:<srid>` coordinate reference system.
///
/// # Examples
///
/// ```
/// use agora::spatial::domain::Crs;
///
/// let crs = Crs::parse("epsg:4326").expect("valid crs");
/// assert_eq!(crs.srid(), 4326);
/// assert_eq!(crs.to_string(), "EPSG:4326");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs(i32);

impl Crs {
    /// WGS 84 geographic coordinates.
    pub const WGS84: Self = Self(WGS84_SRID);

    /// Web Mercator projected coordinates.
    pub const WEB_MERCATOR: Self = Self(3857);

    /// Creates a CRS from its numeric SRID.
    #[must_use]
    pub const fn from_srid(srid: i32) -> Self {
        Self(srid)
    }

    /// Parses `EPSG:<srid>`, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialDomainError::MalformedCrs`] for any other form.
    pub fn parse(value: &str) -> Result<Self, SpatialDomainError> {
        let normalized = value.trim().to_ascii_uppercase();
        normalized
            .strip_prefix(EPSG_PREFIX)
            .and_then(|digits| digits.parse::<i32>().ok())
            .filter(|srid| *srid > 0)
            .map(Self)
            .ok_or_else(|| SpatialDomainError::MalformedCrs(value.to_owned()))
    }

    /// Returns the numeric SRID.
    #[must_use]
    pub const fn srid(self) -> i32 {
        self.0
    }

    /// Returns whether coordinates are longitude/latitude degrees.
    #[must_use]
    pub const fn is_geographic(self) -> bool {
        self.0 == WGS84_SRID
    }
}

impl TryFrom<String> for Crs {
    type Error = SpatialDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{EPSG_PREFIX}{}", self.0)
    }
}
