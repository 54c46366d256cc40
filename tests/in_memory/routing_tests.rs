//! Request forwarding and reply correlation between connected agents.

use crate::test_helpers::{Harness, error_code};
use agora::envelope::domain::{AgentId, CorrelationId, EnvelopeKind, ErrorCode};
use agora::session::{domain::CloseReason, services::SessionStep};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_reaches_holder_and_reply_returns_under_original_id(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;
    let mut bob = harness.connect("bob", &["translate"]).await;

    let step = alice
        .send(&json!({
            "jsonrpc": "2.0",
            "id": "req-1",
            "method": "translate",
            "params": {"text": "hola"}
        }))
        .await;
    assert_eq!(step, SessionStep::Continue);
    assert!(alice.take().is_empty());

    let forwarded = bob.take_one();
    assert_eq!(forwarded.kind(), EnvelopeKind::Request);
    assert_eq!(forwarded.method(), Some("translate"));
    assert_eq!(forwarded.sender().map(AgentId::as_str), Some("alice"));
    assert_eq!(forwarded.params(), Some(&json!({"text": "hola"})));
    let forwarded_id = forwarded.id().cloned().expect("forwarded request carries an id");
    assert_ne!(forwarded_id.to_json(), json!("req-1"));
    assert_eq!(harness.context.router().pending_calls(), 1);

    bob.send(&json!({
        "jsonrpc": "2.0",
        "id": forwarded_id.to_json(),
        "result": {"text": "hello"}
    }))
    .await;

    let reply = alice.take_one();
    assert_eq!(reply.kind(), EnvelopeKind::Response);
    assert_eq!(reply.id().map(CorrelationId::to_json), Some(json!("req-1")));
    assert_eq!(reply.result(), Some(&json!({"text": "hello"})));
    assert_eq!(reply.sender().map(AgentId::as_str), Some("bob"));
    assert_eq!(harness.context.router().pending_calls(), 0);
    assert!(bob.take().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn error_replies_are_relayed_to_the_originator(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;
    let mut bob = harness.connect("bob", &["translate"]).await;

    alice.request("translate", json!({"text": "?"})).await;
    let original = alice.last_id();
    let forwarded = bob.take_one();
    let forwarded_id = forwarded.id().cloned().expect("forwarded id");

    bob.send(&json!({
        "jsonrpc": "2.0",
        "id": forwarded_id.to_json(),
        "error": {"code": -32000, "message": "cannot translate"}
    }))
    .await;

    let reply = alice.take_one();
    assert_eq!(reply.kind(), EnvelopeKind::Error);
    assert_eq!(reply.id().map(CorrelationId::to_json), Some(json!(original)));
    assert_eq!(reply.rpc_error().map(|error| error.code), Some(-32000));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_agent_id_is_rejected_and_first_registration_survives(harness: Harness) {
    let _first = harness.connect("a1", &["echo"]).await;
    let mut second = harness.open();

    let step = second
        .request("agent.register", json!({"agent_id": "a1", "capabilities": []}))
        .await;

    assert_eq!(step, SessionStep::Close(CloseReason::HandshakeRejected));
    assert_eq!(error_code(&second.take_one()), Some(ErrorCode::DuplicateAgent));
    let survivor = harness
        .context
        .registry()
        .lookup(&AgentId::new("a1").expect("valid id"))
        .expect("first registration is kept");
    assert_eq!(survivor.capabilities().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn round_robin_alternates_between_holders(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;
    let bob = harness.connect("bob", &["summarize"]).await;
    let carol = harness.connect("carol", &["summarize"]).await;

    for _ in 0..4 {
        alice.request("summarize", json!({})).await;
    }

    assert_eq!(bob.take().len(), 2);
    assert_eq!(carol.take().len(), 2);
    assert_eq!(harness.context.router().pending_calls(), 4);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn explicit_target_bypasses_capability_lookup(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;
    let bob = harness.connect("bob", &["summarize"]).await;
    let carol = harness.connect("carol", &[]).await;

    alice
        .send(&json!({"jsonrpc": "2.0", "id": 1, "method": "summarize", "to": "carol"}))
        .await;

    assert!(bob.take().is_empty());
    let delivered = carol.take_one();
    assert_eq!(delivered.target().map(AgentId::as_str), Some("carol"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_target_is_answered_with_unknown_agent(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;

    alice
        .send(&json!({"jsonrpc": "2.0", "id": 7, "method": "ping", "to": "ghost"}))
        .await;

    let reply = alice.take_one();
    assert_eq!(error_code(&reply), Some(ErrorCode::UnknownAgent));
    assert_eq!(reply.id().map(CorrelationId::to_json), Some(json!(7)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifications_fan_out_to_every_other_holder(harness: Harness) {
    let mut alice = harness.connect("alice", &["news"]).await;
    let bob = harness.connect("bob", &["news"]).await;
    let carol = harness.connect("carol", &["news"]).await;

    alice
        .send(&json!({"jsonrpc": "2.0", "method": "news", "params": {"headline": "hi"}}))
        .await;

    assert!(alice.take().is_empty());
    for holder in [&bob, &carol] {
        let delivered = holder.take_one();
        assert_eq!(delivered.kind(), EnvelopeKind::Notification);
        assert_eq!(delivered.sender().map(AgentId::as_str), Some("alice"));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reply_without_pending_call_is_dropped(harness: Harness) {
    let alice = harness.connect("alice", &[]).await;
    let mut bob = harness.connect("bob", &[]).await;

    let step = bob
        .send(&json!({"jsonrpc": "2.0", "id": "nope", "result": {}}))
        .await;

    assert_eq!(step, SessionStep::Continue);
    assert!(alice.take().is_empty());
    assert!(bob.take().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reusing_a_pending_id_is_rejected(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;
    let bob = harness.connect("bob", &["summarize"]).await;
    let request = json!({"jsonrpc": "2.0", "id": "dup", "method": "summarize"});

    alice.send(&request).await;
    alice.send(&request).await;

    assert_eq!(bob.take().len(), 1);
    assert_eq!(error_code(&alice.take_one()), Some(ErrorCode::MalformedMessage));
}
