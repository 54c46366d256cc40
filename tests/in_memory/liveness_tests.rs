//! Heartbeat degradation, expiry and call deadlines under a manual clock.

use crate::test_helpers::{Harness, error_code};
use agora::config::ServerConfig;
use agora::envelope::domain::{AgentId, CorrelationId, ErrorCode};
use agora::registry::domain::AgentStatus;
use agora::session::{
    domain::{CloseReason, SessionState},
    services::SessionStep,
};
use chrono::TimeDelta;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

/// Heartbeats every 15 s, calls time out after 5 s.
#[fixture]
fn short_deadline() -> Harness {
    let mut config = ServerConfig::default();
    config.router.call_timeout_ms = 5_000;
    Harness::with_config(config)
}

fn status_of(harness: &Harness, id: &str) -> Option<AgentStatus> {
    let agent = AgentId::new(id).ok()?;
    harness
        .context
        .registry()
        .lookup(&agent)
        .ok()
        .map(|handle| handle.status())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missed_heartbeat_degrades_and_heartbeat_restores(harness: Harness) {
    let mut bob = harness.connect("bob", &["summarize"]).await;

    harness.advance(TimeDelta::seconds(16));
    let report = harness.sweep();

    assert_eq!(report.degraded, 1);
    assert_eq!(status_of(&harness, "bob"), Some(AgentStatus::Degraded));

    bob.request("agent.heartbeat", json!({})).await;
    let reply = bob.take_one();
    assert_eq!(
        reply.result().and_then(|result| result.get("status")),
        Some(&json!("active"))
    );
    assert_eq!(status_of(&harness, "bob"), Some(AgentStatus::Active));
    assert_eq!(bob.session.state(), SessionState::Active);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn degraded_holders_are_skipped_while_an_active_one_exists(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;
    let bob = harness.connect("bob", &["summarize"]).await;
    let mut carol = harness.connect("carol", &["summarize"]).await;

    harness.advance(TimeDelta::seconds(16));
    harness.sweep();
    for agent in [&mut alice, &mut carol] {
        agent.request("agent.heartbeat", json!({})).await;
        agent.take_one();
    }

    alice.request("summarize", json!({})).await;
    alice.request("summarize", json!({})).await;

    assert!(bob.take().is_empty());
    assert_eq!(carol.take().len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn two_silent_intervals_expire_the_agent(harness: Harness) {
    let mut bob = harness.connect("bob", &["summarize"]).await;

    harness.advance(TimeDelta::seconds(31));
    let report = harness.sweep();

    assert_eq!(report.expired, 1);
    assert_eq!(status_of(&harness, "bob"), None);
    assert_eq!(
        bob.connection.closed_reason().as_deref(),
        Some("heartbeat_expired")
    );

    let step = bob.request("agent.heartbeat", json!({})).await;
    assert_eq!(step, SessionStep::Close(CloseReason::HeartbeatExpired));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_session_close_keeps_the_reconnected_registration(harness: Harness) {
    let mut stale = harness.connect("bob", &["summarize"]).await;

    harness.advance(TimeDelta::seconds(31));
    assert_eq!(harness.sweep().expired, 1);

    let mut fresh = harness.connect("bob", &["summarize"]).await;
    stale.session.close(CloseReason::TransportClosed);

    assert_eq!(status_of(&harness, "bob"), Some(AgentStatus::Active));
    let step = fresh.request("agent.heartbeat", json!({})).await;
    assert_eq!(step, SessionStep::Continue);
    assert_eq!(fresh.session.state(), SessionState::Active);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_session_cannot_speak_for_the_reconnected_agent(harness: Harness) {
    let mut stale = harness.connect("bob", &["summarize"]).await;

    harness.advance(TimeDelta::seconds(31));
    harness.sweep();

    let carol = harness.connect("carol", &[]).await;
    let fresh = harness.connect("bob", &["summarize"]).await;
    let step = stale
        .send(&json!({"jsonrpc": "2.0", "to": "carol", "method": "ping"}))
        .await;

    assert_eq!(step, SessionStep::Close(CloseReason::HeartbeatExpired));
    assert!(carol.take().is_empty());
    assert_eq!(fresh.session.state(), SessionState::Active);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unanswered_request_times_out_and_late_reply_is_dropped(short_deadline: Harness) {
    let harness = short_deadline;
    let mut alice = harness.connect("alice", &[]).await;
    let mut bob = harness.connect("bob", &["summarize"]).await;

    alice.request("summarize", json!({})).await;
    let original = alice.last_id();
    let forwarded_id = bob
        .take_one()
        .id()
        .cloned()
        .expect("forwarded id");

    harness.advance(TimeDelta::seconds(6));
    let report = harness.sweep();
    assert_eq!(report.timed_out, 1);

    let timeout = alice.take_one();
    assert_eq!(error_code(&timeout), Some(ErrorCode::Timeout));
    assert_eq!(timeout.id().map(CorrelationId::to_json), Some(json!(original)));

    bob.send(&json!({"jsonrpc": "2.0", "id": forwarded_id.to_json(), "result": {}}))
        .await;
    assert!(alice.take().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn departed_target_answers_pending_calls_with_peer_unavailable(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;
    let mut bob = harness.connect("bob", &["summarize"]).await;

    alice.request("summarize", json!({})).await;
    let original = alice.last_id();
    bob.take_one();

    bob.session.close(CloseReason::TransportClosed);

    let reply = alice.take_one();
    assert_eq!(error_code(&reply), Some(ErrorCode::PeerUnavailable));
    assert_eq!(reply.id().map(CorrelationId::to_json), Some(json!(original)));
    assert_eq!(harness.context.router().pending_calls(), 0);
    assert_eq!(status_of(&harness, "bob"), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn departed_originator_cancels_the_call_at_its_target(harness: Harness) {
    let mut alice = harness.connect("alice", &[]).await;
    let mut bob = harness.connect("bob", &["summarize"]).await;

    alice.request("summarize", json!({})).await;
    let forwarded_id = bob
        .take_one()
        .id()
        .cloned()
        .expect("forwarded id");

    alice.session.close(CloseReason::Disconnect);
    assert_eq!(harness.context.router().pending_calls(), 0);

    let cancelled = bob.take_one();
    assert_eq!(error_code(&cancelled), Some(ErrorCode::PeerUnavailable));
    assert_eq!(cancelled.id(), Some(&forwarded_id));

    bob.send(&json!({"jsonrpc": "2.0", "id": forwarded_id.to_json(), "result": {}}))
        .await;
    assert!(alice.take().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_closes_every_connection(harness: Harness) {
    let alice = harness.connect("alice", &[]).await;
    let bob = harness.connect("bob", &[]).await;

    assert_eq!(harness.context.shutdown(), 2);

    assert!(harness.context.is_shutting_down());
    assert!(harness.context.registry().is_empty());
    for agent in [&alice, &bob] {
        assert_eq!(agent.connection.closed_reason().as_deref(), Some("shutdown"));
    }
}
