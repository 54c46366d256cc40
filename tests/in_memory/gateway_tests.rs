//! Graph and spatial calls issued by agents and answered by the gateways.

use crate::test_helpers::{Harness, error_code};
use agora::config::ServerConfig;
use agora::envelope::domain::{CorrelationId, EnvelopeKind, ErrorCode};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn row_ids(result: Option<&Value>) -> Vec<String> {
    result
        .and_then(|value| value.get("rows"))
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.get("id").and_then(Value::as_str).map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

fn node_ids(result: Option<&Value>) -> Vec<String> {
    let mut ids: Vec<String> = result
        .and_then(|value| value.get("nodes"))
        .and_then(Value::as_array)
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|node| node.get("id").and_then(Value::as_str).map(str::to_owned))
                .collect()
        })
        .unwrap_or_default();
    ids.sort();
    ids
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn nearest_to_returns_k_rows_in_distance_order(harness: Harness) {
    let mut geo = harness.connect("geo1", &[]).await;

    geo.request(
        "spatial.nearestTo",
        json!({"point": [10.0, 20.0], "crs": "EPSG:4326", "k": 3}),
    )
    .await;

    let reply = geo.next().await;
    assert_eq!(reply.kind(), EnvelopeKind::Response);
    assert_eq!(reply.id().map(CorrelationId::to_json), Some(json!(geo.last_id())));
    assert_eq!(row_ids(reply.result()), ["p1", "p2", "p3"]);
    assert_eq!(
        reply.result().and_then(|result| result.get("crs")),
        Some(&json!("EPSG:4326"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn within_distance_uses_metres_for_geographic_crs(harness: Harness) {
    let mut geo = harness.connect("geo1", &[]).await;

    geo.request(
        "spatial.withinDistance",
        json!({"point": [10.0, 20.0], "crs": "EPSG:4326", "radius": 15000.0}),
    )
    .await;

    let reply = geo.next().await;
    assert_eq!(row_ids(reply.result()), ["p1", "p2"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn query_region_returns_contained_rows(harness: Harness) {
    let mut geo = harness.connect("geo1", &[]).await;

    geo.request(
        "spatial.queryRegion",
        json!({"bounds": [9.95, 19.95, 10.35, 20.05], "crs": "EPSG:4326"}),
    )
    .await;

    let reply = geo.next().await;
    let mut ids = row_ids(reply.result());
    ids.sort();
    assert_eq!(ids, ["p1", "p2", "p3"]);
}

#[rstest]
#[case::unconfigured_epsg("EPSG:27700")]
#[case::ogc_urn("OGC:CRS84")]
#[case::bare_name("WGS84")]
#[tokio::test(flavor = "multi_thread")]
async fn unserved_crs_is_rejected(harness: Harness, #[case] crs: &str) {
    let mut geo = harness.connect("geo1", &[]).await;

    geo.request(
        "spatial.nearestTo",
        json!({"point": [10.0, 20.0], "crs": crs, "k": 1}),
    )
    .await;

    assert_eq!(error_code(&geo.next().await), Some(ErrorCode::UnsupportedCrs));
}

#[rstest]
#[case::zero_k(json!({"point": [10.0, 20.0], "crs": "EPSG:4326", "k": 0}))]
#[case::latitude_out_of_range(json!({"point": [10.0, 95.0], "crs": "EPSG:4326", "k": 1}))]
#[case::missing_crs(json!({"point": [10.0, 20.0], "k": 1}))]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_spatial_params_are_rejected_before_the_store(
    harness: Harness,
    #[case] params: Value,
) {
    let mut geo = harness.connect("geo1", &[]).await;

    geo.request("spatial.nearestTo", params).await;

    assert_eq!(error_code(&geo.take_one()), Some(ErrorCode::InvalidParams));
    assert_eq!(harness.context.router().pending_calls(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn upserting_a_node_twice_keeps_one_node(harness: Harness) {
    let mut kg = harness.connect("kg1", &[]).await;

    for colour in ["red", "blue"] {
        kg.request(
            "graph.upsertNode",
            json!({"id": "n1", "labels": ["Piece"], "properties": {"colour": colour}}),
        )
        .await;
        let reply = kg.next().await;
        assert_eq!(reply.kind(), EnvelopeKind::Response, "upsert {colour}");
    }

    kg.request("graph.queryNeighbors", json!({"id": "n1", "depth": 1}))
        .await;
    let reply = kg.next().await;
    assert_eq!(node_ids(reply.result()), ["n1"]);
    let colour = reply
        .result()
        .and_then(|result| result.pointer("/nodes/0/properties/colour"))
        .cloned();
    assert_eq!(colour, Some(json!("blue")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cached_neighborhood_reflects_later_writes() {
    let mut config = ServerConfig::default();
    config.graph.cache_enabled = true;
    let harness = Harness::with_config(config);
    let mut kg = harness.connect("kg1", &[]).await;

    for id in ["n1", "n2", "n3"] {
        kg.request("graph.upsertNode", json!({"id": id})).await;
        kg.next().await;
    }
    kg.request(
        "graph.upsertEdge",
        json!({"from": "n1", "to": "n2", "type": "ADJACENT"}),
    )
    .await;
    kg.next().await;

    kg.request("graph.queryNeighbors", json!({"id": "n1"})).await;
    assert_eq!(node_ids(kg.next().await.result()), ["n1", "n2"]);

    kg.request(
        "graph.upsertEdge",
        json!({"from": "n1", "to": "n3", "type": "ADJACENT"}),
    )
    .await;
    kg.next().await;

    kg.request("graph.queryNeighbors", json!({"id": "n1"})).await;
    assert_eq!(node_ids(kg.next().await.result()), ["n1", "n2", "n3"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn path_query_follows_edges(harness: Harness) {
    let mut kg = harness.connect("kg1", &[]).await;
    for id in ["a", "b", "c"] {
        kg.request("graph.upsertNode", json!({"id": id})).await;
        kg.next().await;
    }
    for (from, to) in [("a", "b"), ("b", "c")] {
        kg.request(
            "graph.upsertEdge",
            json!({"from": from, "to": to, "type": "NEXT"}),
        )
        .await;
        kg.next().await;
    }

    kg.request("graph.queryPath", json!({"from": "a", "to": "c"}))
        .await;

    let reply = kg.next().await;
    assert_eq!(node_ids(reply.result()), ["a", "b", "c"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_graph_method_is_not_found(harness: Harness) {
    let mut kg = harness.connect("kg1", &[]).await;

    kg.request("graph.dropEverything", json!({})).await;

    assert_eq!(error_code(&kg.take_one()), Some(ErrorCode::MethodNotFound));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn edge_to_missing_node_is_a_query_error(harness: Harness) {
    let mut kg = harness.connect("kg1", &[]).await;

    kg.request(
        "graph.upsertEdge",
        json!({"from": "ghost", "to": "phantom", "type": "NEXT"}),
    )
    .await;

    assert_eq!(error_code(&kg.next().await), Some(ErrorCode::GraphQueryError));
}
