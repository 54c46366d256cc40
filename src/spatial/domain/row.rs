//! Normalized rows returned by spatial queries.

use super::{Crs, Point};
use serde_json::{Map, Value, json};

/// A stored point feature with free-form attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialFeature {
    id: String,
    location: Point,
    crs: Crs,
    attributes: Map<String, Value>,
}

impl SpatialFeature {
    /// Creates a feature without attributes.
    #[must_use]
    pub fn new(id: impl Into<String>, location: Point, crs: Crs) -> Self {
        Self {
            id: id.into(),
            location,
            crs,
            attributes: Map::new(),
        }
    }

    /// Adds one attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Returns the feature identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the feature location.
    #[must_use]
    pub const fn location(&self) -> Point {
        self.location
    }

    /// Returns the CRS the location is expressed in.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// Returns the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Converts the feature into a result row.
    #[must_use]
    pub fn to_row(&self, distance: Option<f64>) -> SpatialRow {
        SpatialRow {
            id: self.id.clone(),
            location: self.location,
            attributes: self.attributes.clone(),
            distance,
        }
    }
}

/// A single geometry/attribute row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRow {
    /// Row identifier.
    pub id: String,
    /// Point geometry.
    pub location: Point,
    /// Row attributes.
    pub attributes: Map<String, Value>,
    /// Distance from the query point, for distance queries.
    pub distance: Option<f64>,
}

impl SpatialRow {
    /// Renders the wire form of the row.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut row = json!({
            "id": self.id,
            "geometry": {
                "type": "Point",
                "coordinates": [self.location.x(), self.location.y()],
            },
            "attributes": self.attributes,
        });
        if let (Some(distance), Value::Object(members)) = (self.distance, &mut row) {
            members.insert("distance".to_owned(), json!(distance));
        }
        row
    }
}

/// Rows returned by one spatial query.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialQueryResult {
    /// Rows, ordered by ascending distance for distance queries.
    pub rows: Vec<SpatialRow>,
    /// CRS the coordinates are expressed in.
    pub crs: Crs,
}

impl SpatialQueryResult {
    /// Creates a result.
    #[must_use]
    pub const fn new(rows: Vec<SpatialRow>, crs: Crs) -> Self {
        Self { rows, crs }
    }

    /// Renders the `{rows, crs}` wire form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "rows": self.rows.iter().map(SpatialRow::to_json).collect::<Vec<_>>(),
            "crs": self.crs.to_string(),
        })
    }
}
