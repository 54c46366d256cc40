//! Unit tests for the in-memory spatial store.

use crate::spatial::{
    adapters::InMemorySpatialStore,
    domain::{Crs, Point, Polygon, SpatialFeature, SpatialQueryResult},
    ports::SpatialStore,
};
use rstest::{fixture, rstest};
use serde_json::json;

fn ids(result: &SpatialQueryResult) -> Vec<&str> {
    result.rows.iter().map(|row| row.id.as_str()).collect()
}

#[fixture]
fn store() -> InMemorySpatialStore {
    InMemorySpatialStore::with_features([
        SpatialFeature::new("origin", Point::new(10.0, 20.0), Crs::WGS84)
            .with_attribute("name", json!("Origin")),
        SpatialFeature::new("east", Point::new(10.1, 20.0), Crs::WGS84),
        SpatialFeature::new("far-east", Point::new(11.0, 20.0), Crs::WGS84),
        SpatialFeature::new("remote", Point::new(15.0, 20.0), Crs::WGS84),
        SpatialFeature::new("north", Point::new(10.0, 20.05), Crs::WGS84),
        SpatialFeature::new("projected", Point::new(10.0, 20.0), Crs::WEB_MERCATOR),
    ])
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn nearest_to_orders_by_great_circle_distance(store: InMemorySpatialStore) {
    let result = store
        .nearest_to(Point::new(10.0, 20.0), Crs::WGS84, 3)
        .await
        .expect("query succeeds");

    assert_eq!(ids(&result), vec!["origin", "north", "east"]);
    assert_eq!(result.crs, Crs::WGS84);
    let distances: Vec<f64> = result.rows.iter().filter_map(|row| row.distance).collect();
    assert_eq!(distances.len(), 3);
    assert!(distances.windows(2).all(|pair| pair.first() <= pair.last()));
    assert!(distances.get(1).is_some_and(|metres| (5_500.0..5_600.0).contains(metres)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn within_distance_filters_by_radius(store: InMemorySpatialStore) {
    let result = store
        .within_distance(Point::new(10.0, 20.0), Crs::WGS84, 6_000.0)
        .await
        .expect("query succeeds");
    assert_eq!(ids(&result), vec!["origin", "north"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn query_region_returns_contained_points(store: InMemorySpatialStore) {
    let bounds = Polygon::from_bounds([9.5, 19.5, 10.5, 20.5], Crs::WGS84).expect("bounds");
    let result = store
        .query_region(bounds, Crs::WGS84)
        .await
        .expect("query succeeds");

    let mut found = ids(&result);
    found.sort_unstable();
    assert_eq!(found, vec!["east", "north", "origin"]);
    assert!(result.rows.iter().all(|row| row.distance.is_none()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn queries_only_match_features_in_the_requested_crs(store: InMemorySpatialStore) {
    let result = store
        .nearest_to(Point::new(10.0, 20.0), Crs::WEB_MERCATOR, 10)
        .await
        .expect("query succeeds");
    assert_eq!(ids(&result), vec!["projected"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn projected_distances_are_planar() {
    let store = InMemorySpatialStore::with_features([SpatialFeature::new(
        "corner",
        Point::new(3.0, 4.0),
        Crs::WEB_MERCATOR,
    )]);
    let result = store
        .nearest_to(Point::new(0.0, 0.0), Crs::WEB_MERCATOR, 1)
        .await
        .expect("query succeeds");
    assert_eq!(result.rows.first().and_then(|row| row.distance), Some(5.0));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn insert_replaces_features_with_the_same_id(store: InMemorySpatialStore) {
    store
        .insert(SpatialFeature::new("origin", Point::new(-10.0, -20.0), Crs::WGS84))
        .expect("insert succeeds");
    assert_eq!(store.feature_count().expect("count"), 6);

    let result = store
        .nearest_to(Point::new(-10.0, -20.0), Crs::WGS84, 1)
        .await
        .expect("query succeeds");
    assert_eq!(ids(&result), vec!["origin"]);
    assert!(result.rows.iter().all(|row| row.attributes.is_empty()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ping_succeeds(store: InMemorySpatialStore) {
    assert!(store.ping().await.is_ok());
}
