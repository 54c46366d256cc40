//! Unit tests for graph operation parsing.

use crate::graph::domain::{GraphDomainError, GraphOperation, NodeId};
use rstest::rstest;
use serde_json::{Value, json};

#[rstest]
fn upsert_node_parses_labels_and_properties() {
    let params = json!({"id": "n1", "labels": ["Site", " Site "], "properties": {"name": "X"}});
    let operation =
        GraphOperation::parse("graph.upsertNode", Some(&params)).expect("valid operation");

    let GraphOperation::UpsertNode {
        id,
        labels,
        properties,
    } = operation
    else {
        panic!("expected an upsertNode operation");
    };
    assert_eq!(id, NodeId::new("n1").expect("valid id"));
    assert_eq!(labels.len(), 1);
    assert_eq!(properties.get("name"), Some(&json!("X")));
}

#[rstest]
fn upsert_node_defaults_optional_fields() {
    let params = json!({"id": "n1"});
    let operation =
        GraphOperation::parse("graph.upsertNode", Some(&params)).expect("valid operation");
    assert!(matches!(
        operation,
        GraphOperation::UpsertNode { ref labels, ref properties, .. }
            if labels.is_empty() && properties.is_empty()
    ));
}

#[rstest]
fn query_neighbors_defaults_depth_to_one() {
    let params = json!({"id": "n1"});
    let operation =
        GraphOperation::parse("graph.queryNeighbors", Some(&params)).expect("valid operation");
    assert!(matches!(
        operation,
        GraphOperation::QueryNeighbors { depth: 1, .. }
    ));
}

#[rstest]
#[case(0)]
#[case(6)]
#[case(300)]
fn query_neighbors_rejects_depth_out_of_range(#[case] depth: u64) {
    let params = json!({"id": "n1", "depth": depth});
    let result = GraphOperation::parse("graph.queryNeighbors", Some(&params));
    assert_eq!(result, Err(GraphDomainError::DepthOutOfRange(depth)));
}

#[rstest]
#[case("graph.upsertNode", json!({}))]
#[case("graph.upsertNode", json!({"id": 7}))]
#[case("graph.upsertEdge", json!({"from": "a", "to": "b"}))]
#[case("graph.queryPath", json!({"from": "a"}))]
#[case("graph.queryNeighbors", json!([1, 2]))]
fn malformed_params_are_invalid(#[case] method: &str, #[case] params: Value) {
    let result = GraphOperation::parse(method, Some(&params));
    assert!(matches!(result, Err(GraphDomainError::InvalidParams(_))));
}

#[rstest]
fn missing_params_are_invalid_for_required_fields() {
    let result = GraphOperation::parse("graph.queryPath", None);
    assert!(matches!(result, Err(GraphDomainError::InvalidParams(_))));
}

#[rstest]
#[case(json!({"id": "  "}), GraphDomainError::EmptyNodeId)]
#[case(json!({"id": "n1", "labels": [""]}), GraphDomainError::EmptyLabel)]
fn empty_identifiers_are_rejected(#[case] params: Value, #[case] expected: GraphDomainError) {
    let result = GraphOperation::parse("graph.upsertNode", Some(&params));
    assert_eq!(result, Err(expected));
}

#[rstest]
fn unknown_graph_method_is_reported() {
    let result = GraphOperation::parse("graph.deleteNode", Some(&json!({"id": "n1"})));
    assert_eq!(
        result,
        Err(GraphDomainError::UnknownOperation("graph.deleteNode".to_owned()))
    );
}

#[rstest]
fn mutations_report_touched_nodes() {
    let params = json!({"from": "a", "to": "b", "type": "NEAR"});
    let operation =
        GraphOperation::parse("graph.upsertEdge", Some(&params)).expect("valid operation");
    assert!(operation.is_mutation());
    let touched: Vec<String> = operation
        .touched_nodes()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(touched, vec!["a", "b"]);
}
