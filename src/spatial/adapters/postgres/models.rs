//! Diesel row models for spatial query results.

use crate::spatial::domain::{Point, SpatialRow};
use diesel::prelude::*;
use diesel::sql_types::{Double, Nullable, Text};
use serde_json::{Map, Value};

/// One row of a spatial query over the point table.
#[derive(Debug, Clone, QueryableByName)]
pub struct SpatialRowRecord {
    /// Source row number rendered as text.
    #[diesel(sql_type = Text)]
    pub id: String,
    /// X coordinate in the requested CRS.
    #[diesel(sql_type = Double)]
    pub x: f64,
    /// Y coordinate in the requested CRS.
    #[diesel(sql_type = Double)]
    pub y: f64,
    #[diesel(sql_type = Nullable<Text>)]
    pub name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub entity: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub sub_entity: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub description: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub source_url: Option<String>,
    /// Distance from the query point, for distance queries.
    #[diesel(sql_type = Nullable<Double>)]
    pub distance: Option<f64>,
}

impl From<SpatialRowRecord> for SpatialRow {
    fn from(record: SpatialRowRecord) -> Self {
        let mut attributes = Map::new();
        for (name, value) in [
            ("name", record.name),
            ("entity", record.entity),
            ("sub_entity", record.sub_entity),
            ("description", record.description),
            ("source_url", record.source_url),
        ] {
            if let Some(text) = value {
                attributes.insert(name.to_owned(), Value::String(text));
            }
        }
        Self {
            id: record.id,
            location: Point::new(record.x, record.y),
            attributes,
            distance: record.distance,
        }
    }
}
