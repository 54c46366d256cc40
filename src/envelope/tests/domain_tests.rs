//! Unit tests for envelope domain types.

use crate::envelope::domain::{
    AgentId, CorrelationId, EnvelopeDomainError, EnvelopeKind, ErrorCode, ParseEnvelopeKindError,
    RpcError,
};
use rstest::rstest;
use serde_json::json;

// ── AgentId validation ─────────────────────────────────────────────

#[rstest]
#[case("a1")]
#[case("geo1")]
#[case("planner.eu-west")]
#[case("kg:primary_2")]
fn valid_agent_ids_are_accepted(#[case] input: &str) {
    let id = AgentId::new(input).expect("valid agent id");
    assert_eq!(id.as_str(), input);
}

#[rstest]
fn agent_id_is_trimmed_and_keeps_case() {
    let id = AgentId::new("  Geo1  ").expect("valid after trim");
    assert_eq!(id.as_str(), "Geo1");
}

#[rstest]
#[case("")]
#[case("   ")]
fn empty_agent_id_is_rejected(#[case] input: &str) {
    assert_eq!(AgentId::new(input), Err(EnvelopeDomainError::EmptyAgentId));
}

#[rstest]
#[case("has space")]
#[case("slash/agent")]
#[case("émile")]
fn agent_id_with_invalid_characters_is_rejected(#[case] input: &str) {
    assert!(matches!(
        AgentId::new(input),
        Err(EnvelopeDomainError::InvalidAgentId(_))
    ));
}

#[rstest]
#[case(128, true)]
#[case(129, false)]
fn agent_id_length_boundary(#[case] length: usize, #[case] expected_ok: bool) {
    let result = AgentId::new("a".repeat(length));
    if expected_ok {
        assert!(result.is_ok(), "expected length {length} to be accepted");
    } else {
        assert!(matches!(
            result,
            Err(EnvelopeDomainError::AgentIdTooLong(_))
        ));
    }
}

#[rstest]
fn agent_id_deserialization_validates() {
    let parsed: Result<AgentId, _> = serde_json::from_value(json!("bad id"));
    assert!(parsed.is_err());
}

// ── CorrelationId ─────────────────────────────────────────────────

#[rstest]
fn correlation_id_accepts_integers_and_strings() {
    assert_eq!(
        CorrelationId::from_json(&json!(7)),
        Some(CorrelationId::Number(7))
    );
    assert_eq!(
        CorrelationId::from_json(&json!("abc")),
        Some(CorrelationId::Text("abc".to_owned()))
    );
}

#[rstest]
#[case(json!(null))]
#[case(json!(1.5))]
#[case(json!({"nested": 1}))]
#[case(json!([1]))]
fn correlation_id_rejects_other_values(#[case] value: serde_json::Value) {
    assert_eq!(CorrelationId::from_json(&value), None);
}

#[rstest]
fn minted_correlation_ids_are_unique() {
    let first = CorrelationId::minted();
    let second = CorrelationId::minted();
    assert_ne!(first, second);
    assert!(first.to_string().starts_with("agora-"));
}

// ── EnvelopeKind ──────────────────────────────────────────────────

#[rstest]
#[case(EnvelopeKind::Request, "request")]
#[case(EnvelopeKind::Response, "response")]
#[case(EnvelopeKind::Notification, "notification")]
#[case(EnvelopeKind::Error, "error")]
fn envelope_kind_round_trips_through_str(#[case] kind: EnvelopeKind, #[case] text: &str) {
    assert_eq!(kind.as_str(), text);
    assert_eq!(EnvelopeKind::try_from(text), Ok(kind));
}

#[rstest]
fn unknown_envelope_kind_is_rejected() {
    assert_eq!(
        EnvelopeKind::try_from("event"),
        Err(ParseEnvelopeKindError("event".to_owned()))
    );
}

// ── ErrorCode taxonomy ────────────────────────────────────────────

#[rstest]
#[case(ErrorCode::ParseError, -32700, "parse_error")]
#[case(ErrorCode::MalformedMessage, -32600, "malformed_message")]
#[case(ErrorCode::MethodNotFound, -32601, "method_not_found")]
#[case(ErrorCode::InvalidParams, -32602, "invalid_params")]
#[case(ErrorCode::Internal, -32603, "internal_error")]
#[case(ErrorCode::UnknownAgent, -32001, "unknown_agent")]
#[case(ErrorCode::DuplicateAgent, -32002, "duplicate_agent")]
#[case(ErrorCode::PeerUnavailable, -32003, "peer_unavailable")]
#[case(ErrorCode::Timeout, -32004, "timeout")]
#[case(ErrorCode::Unauthorized, -32005, "unauthorized")]
#[case(ErrorCode::HandshakeRequired, -32006, "handshake_required")]
#[case(ErrorCode::GraphStoreUnavailable, -32010, "graph_store_unavailable")]
#[case(ErrorCode::GraphQueryError, -32011, "graph_query_error")]
#[case(ErrorCode::SpatialStoreUnavailable, -32020, "spatial_store_unavailable")]
#[case(ErrorCode::SpatialQueryError, -32021, "spatial_query_error")]
#[case(ErrorCode::UnsupportedCrs, -32022, "unsupported_crs")]
fn error_codes_are_stable(#[case] code: ErrorCode, #[case] numeric: i64, #[case] kind: &str) {
    assert_eq!(code.code(), numeric);
    assert_eq!(code.as_str(), kind);
    assert_eq!(ErrorCode::from_code(numeric), Some(code));
}

#[rstest]
fn error_codes_are_distinct() {
    let mut numbers: Vec<i64> = ErrorCode::ALL.iter().map(|code| code.code()).collect();
    numbers.sort_unstable();
    numbers.dedup();
    assert_eq!(numbers.len(), ErrorCode::ALL.len());
}

#[rstest]
fn rpc_error_carries_kind_and_detail() {
    let error = RpcError::from_code(ErrorCode::InvalidParams).with_detail("k must be positive");

    assert_eq!(error.code, -32602);
    assert_eq!(error.message, "Invalid params");
    assert_eq!(error.kind(), Some("invalid_params"));
    assert_eq!(error.detail(), Some("k must be positive"));
    assert_eq!(error.error_code(), Some(ErrorCode::InvalidParams));
}

#[rstest]
fn rpc_error_without_data_gains_detail() {
    let error = RpcError {
        code: -1,
        message: "custom".to_owned(),
        data: None,
    }
    .with_detail("extra");

    assert_eq!(error.detail(), Some("extra"));
    assert_eq!(error.kind(), None);
    assert_eq!(error.error_code(), None);
}
