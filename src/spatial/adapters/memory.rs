//! In-memory point store.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::spatial::{
    domain::{Crs, Point, Polygon, SpatialFeature, SpatialQueryResult, SpatialRow},
    ports::{SpatialStore, SpatialStoreError, SpatialStoreResult},
};

/// Mean Earth radius used by the haversine formula.
const EARTH_RADIUS_METRES: f64 = 6_371_008.8;

/// Thread-safe in-memory point store.
///
/// Features are only matched against queries in their own CRS. Distances
/// are great-circle metres for EPSG:4326 and planar CRS units otherwise.
#[derive(Debug, Clone, Default)]
pub struct InMemorySpatialStore {
    features: Arc<RwLock<Vec<SpatialFeature>>>,
}

impl InMemorySpatialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `features`.
    #[must_use]
    pub fn with_features(features: impl IntoIterator<Item = SpatialFeature>) -> Self {
        Self {
            features: Arc::new(RwLock::new(features.into_iter().collect())),
        }
    }

    /// Adds or replaces the feature with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialStoreError::Unavailable`] when the lock is poisoned.
    pub fn insert(&self, feature: SpatialFeature) -> SpatialStoreResult<()> {
        let mut features = self.features.write().map_err(lock_error)?;
        features.retain(|existing| existing.id() != feature.id());
        features.push(feature);
        Ok(())
    }

    /// Returns the number of stored features.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialStoreError::Unavailable`] when the lock is poisoned.
    pub fn feature_count(&self) -> SpatialStoreResult<usize> {
        Ok(self.features.read().map_err(lock_error)?.len())
    }

    fn ranked(&self, point: Point, crs: Crs) -> SpatialStoreResult<Vec<SpatialRow>> {
        let features = self.features.read().map_err(lock_error)?;
        let mut rows: Vec<SpatialRow> = features
            .iter()
            .filter(|feature| feature.crs() == crs)
            .map(|feature| feature.to_row(Some(distance(crs, point, feature.location()))))
            .collect();
        rows.sort_by(|left, right| {
            left.distance
                .unwrap_or(f64::INFINITY)
                .total_cmp(&right.distance.unwrap_or(f64::INFINITY))
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(rows)
    }
}

fn lock_error<E: std::fmt::Display>(err: E) -> SpatialStoreError {
    SpatialStoreError::unavailable(std::io::Error::other(err.to_string()))
}

fn distance(crs: Crs, from: Point, to: Point) -> f64 {
    if crs.is_geographic() {
        haversine_metres(from, to)
    } else {
        planar(from, to)
    }
}

#[expect(clippy::float_arithmetic, reason = "great-circle distance")]
fn haversine_metres(from: Point, to: Point) -> f64 {
    let lat_from = from.y().to_radians();
    let lat_to = to.y().to_radians();
    let delta_lat = (to.y() - from.y()).to_radians();
    let delta_lon = (to.x() - from.x()).to_radians();
    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + lat_from.cos() * lat_to.cos() * (delta_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METRES * half_chord.sqrt().min(1.0).asin()
}

#[expect(clippy::float_arithmetic, reason = "euclidean distance")]
fn planar(from: Point, to: Point) -> f64 {
    (to.x() - from.x()).hypot(to.y() - from.y())
}

#[async_trait]
impl SpatialStore for InMemorySpatialStore {
    fn serves(&self, _crs: Crs) -> bool {
        true
    }

    async fn query_region(&self, polygon: Polygon, crs: Crs) -> SpatialStoreResult<SpatialQueryResult> {
        let features = self.features.read().map_err(lock_error)?;
        let rows = features
            .iter()
            .filter(|feature| feature.crs() == crs && polygon.contains(feature.location()))
            .map(|feature| feature.to_row(None))
            .collect();
        Ok(SpatialQueryResult::new(rows, crs))
    }

    async fn nearest_to(
        &self,
        point: Point,
        crs: Crs,
        k: u16,
    ) -> SpatialStoreResult<SpatialQueryResult> {
        let mut rows = self.ranked(point, crs)?;
        rows.truncate(usize::from(k));
        Ok(SpatialQueryResult::new(rows, crs))
    }

    async fn within_distance(
        &self,
        point: Point,
        crs: Crs,
        radius: f64,
    ) -> SpatialStoreResult<SpatialQueryResult> {
        let rows = self
            .ranked(point, crs)?
            .into_iter()
            .filter(|row| row.distance.is_some_and(|metres| metres <= radius))
            .collect();
        Ok(SpatialQueryResult::new(rows, crs))
    }

    async fn ping(&self) -> SpatialStoreResult<()> {
        self.features.read().map_err(lock_error).map(|_| ())
    }
}
