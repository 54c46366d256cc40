//! Unit tests for the agent registry service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::envelope::domain::{AgentId, Envelope, ErrorCode};
use crate::registry::{
    adapters::RecordingConnection,
    domain::{AgentHandle, AgentStatus, Capability, DeregistrationReason},
    ports::{AgentConnection, DeregistrationListener},
    services::{AgentRegistry, RegistryError},
};
use chrono::TimeDelta;
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};

type TestRegistry = AgentRegistry<DefaultClock>;

const HEARTBEAT: Duration = Duration::from_secs(15);

#[fixture]
fn registry() -> TestRegistry {
    AgentRegistry::new(Arc::new(DefaultClock), HEARTBEAT)
}

fn agent(raw: &str) -> AgentId {
    AgentId::new(raw).expect("valid agent id")
}

fn capabilities(names: &[&str]) -> Vec<Capability> {
    Capability::parse_all(names.iter().copied()).expect("valid capabilities")
}

fn register(registry: &TestRegistry, id: &str, names: &[&str]) -> RecordingConnection {
    let connection = RecordingConnection::new();
    registry
        .register(agent(id), capabilities(names), Arc::new(connection.clone()))
        .expect("registration should succeed");
    connection
}

#[derive(Default)]
struct CapturingListener {
    seen: Mutex<Vec<(AgentId, DeregistrationReason)>>,
}

impl DeregistrationListener for CapturingListener {
    fn on_deregistered(&self, agent: &AgentHandle, reason: DeregistrationReason) {
        self.seen
            .lock()
            .expect("listener lock")
            .push((agent.id().clone(), reason));
    }
}

#[rstest]
fn register_and_lookup(registry: TestRegistry) {
    register(&registry, "a1", &["plan"]);

    let handle = registry.lookup(&agent("a1")).expect("lookup succeeds");
    assert_eq!(handle.status(), AgentStatus::Active);
    assert!(handle.serves(&Capability::new("plan").expect("valid")));
}

#[rstest]
fn duplicate_registration_keeps_first_agent(registry: TestRegistry) {
    let first = register(&registry, "a1", &["plan"]);

    let result = registry.register(
        agent("a1"),
        capabilities(&["other"]),
        Arc::new(RecordingConnection::new()),
    );
    assert_eq!(result.err(), Some(RegistryError::DuplicateAgent(agent("a1"))));

    let handle = registry.lookup(&agent("a1")).expect("first agent remains");
    handle
        .deliver(Envelope::notification("ping"))
        .expect("first connection reachable");
    assert_eq!(first.delivered().len(), 1);
    assert_eq!(registry.find(&Capability::new("other").expect("valid")).len(), 0);
}

#[rstest]
fn unknown_agent_operations_fail(registry: TestRegistry) {
    let missing = agent("ghost");
    assert_eq!(
        registry.heartbeat(&missing).err(),
        Some(RegistryError::UnknownAgent(missing.clone()))
    );
    assert!(registry.lookup(&missing).is_err());
    assert!(registry.update_capabilities(&missing, Vec::new()).is_err());
    let err = registry
        .deregister(&missing, DeregistrationReason::Disconnect)
        .expect_err("unknown agent");
    assert_eq!(err.to_error_code(), ErrorCode::UnknownAgent);
}

#[rstest]
fn find_returns_holders_in_registration_order(registry: TestRegistry) {
    register(&registry, "b", &["plan"]);
    register(&registry, "a", &["plan", "route"]);
    register(&registry, "c", &["route"]);

    let holders: Vec<String> = registry
        .find(&Capability::new("plan").expect("valid"))
        .iter()
        .map(|handle| handle.id().to_string())
        .collect();
    assert_eq!(holders, vec!["b", "a"]);
}

#[rstest]
fn update_capabilities_reindexes(registry: TestRegistry) {
    register(&registry, "a1", &["plan"]);

    registry
        .update_capabilities(&agent("a1"), capabilities(&["route"]))
        .expect("update succeeds");

    assert!(registry.find(&Capability::new("plan").expect("valid")).is_empty());
    assert_eq!(registry.find(&Capability::new("route").expect("valid")).len(), 1);
}

#[rstest]
fn deregister_notifies_listeners_once(registry: TestRegistry) {
    let listener = Arc::new(CapturingListener::default());
    registry.add_listener(listener.clone());
    register(&registry, "a1", &["plan"]);

    let removed = registry
        .deregister(&agent("a1"), DeregistrationReason::Disconnect)
        .expect("first deregistration succeeds");
    assert_eq!(removed.status(), AgentStatus::Disconnected);

    let second = registry.deregister(&agent("a1"), DeregistrationReason::Disconnect);
    assert!(matches!(second, Err(RegistryError::UnknownAgent(_))));

    let seen = listener.seen.lock().expect("listener lock");
    assert_eq!(*seen, vec![(agent("a1"), DeregistrationReason::Disconnect)]);
    assert!(registry.find(&Capability::new("plan").expect("valid")).is_empty());
}

#[rstest]
fn deregister_connection_only_removes_the_owning_registration(registry: TestRegistry) {
    let listener = Arc::new(CapturingListener::default());
    registry.add_listener(listener.clone());
    let owner: Arc<dyn AgentConnection> = Arc::new(RecordingConnection::new());
    let stranger: Arc<dyn AgentConnection> = Arc::new(RecordingConnection::new());
    registry
        .register(agent("a1"), capabilities(&["plan"]), Arc::clone(&owner))
        .expect("registration should succeed");

    let refused =
        registry.deregister_connection(&agent("a1"), &stranger, DeregistrationReason::TransportClosed);
    assert!(matches!(refused, Err(RegistryError::UnknownAgent(_))));
    let handle = registry.lookup(&agent("a1")).expect("still registered");
    assert!(handle.is_bound_to(&owner));
    assert!(listener.seen.lock().expect("listener lock").is_empty());

    registry
        .deregister_connection(&agent("a1"), &owner, DeregistrationReason::TransportClosed)
        .expect("owner deregisters");
    assert!(registry.lookup(&agent("a1")).is_err());
    assert_eq!(listener.seen.lock().expect("listener lock").len(), 1);
}

#[rstest]
fn liveness_sweep_degrades_then_expires(registry: TestRegistry) {
    register(&registry, "a1", &["plan"]);
    let now = DefaultClock.utc();

    let quiet = registry.sweep_liveness(now);
    assert!(quiet.is_empty());

    let first = registry.sweep_liveness(now + TimeDelta::seconds(16));
    assert_eq!(first.degraded, vec![agent("a1")]);
    assert!(first.expired.is_empty());
    assert_eq!(
        registry.lookup(&agent("a1")).expect("still registered").status(),
        AgentStatus::Degraded
    );

    let second = registry.sweep_liveness(now + TimeDelta::seconds(31));
    assert!(second.degraded.is_empty());
    assert_eq!(second.expired, vec![agent("a1")]);
}

#[rstest]
fn heartbeat_restores_degraded_agent(registry: TestRegistry) {
    register(&registry, "a1", &["plan"]);
    let later = DefaultClock.utc() + TimeDelta::seconds(16);
    let _degraded = registry.sweep_liveness(later);

    let handle = registry.heartbeat(&agent("a1")).expect("heartbeat succeeds");
    assert_eq!(handle.status(), AgentStatus::Active);
}

#[rstest]
fn find_prefers_active_over_degraded(registry: TestRegistry) {
    register(&registry, "old", &["plan"]);
    let later = DefaultClock.utc() + TimeDelta::seconds(16);
    let _degraded = registry.sweep_liveness(later);
    register(&registry, "fresh", &["plan"]);

    let capability = Capability::new("plan").expect("valid");
    let holders = registry.find(&capability);
    assert_eq!(holders.len(), 1);
    assert_eq!(holders.first().map(|h| h.id().as_str()), Some("fresh"));

    registry
        .deregister(&agent("fresh"), DeregistrationReason::Disconnect)
        .expect("deregistered");
    let fallback = registry.find(&capability);
    assert_eq!(fallback.first().map(|h| h.id().as_str()), Some("old"));
}

#[rstest]
fn find_for_skips_the_requester_before_preferring_active(registry: TestRegistry) {
    register(&registry, "old", &["plan"]);
    let later = DefaultClock.utc() + TimeDelta::seconds(16);
    let _degraded = registry.sweep_liveness(later);
    register(&registry, "caller", &["plan"]);

    let capability = Capability::new("plan").expect("valid");
    let holders: Vec<String> = registry
        .find_for(&capability, &agent("caller"))
        .iter()
        .map(|handle| handle.id().to_string())
        .collect();
    assert_eq!(holders, vec!["old"]);
    let for_old = registry.find_for(&capability, &agent("old"));
    assert_eq!(for_old.len(), 1);
    assert_eq!(for_old.first().map(|h| h.id().as_str()), Some("caller"));
}

#[rstest]
fn stats_count_statuses(registry: TestRegistry) {
    register(&registry, "a1", &["plan"]);
    register(&registry, "a2", &["plan"]);
    let later = DefaultClock.utc() + TimeDelta::seconds(16);
    let _degraded = registry.sweep_liveness(later);
    register(&registry, "a3", &["plan"]);

    let stats = registry.stats();
    assert_eq!(stats.agents, 3);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.degraded, 2);
}

#[rstest]
fn list_filters_by_capability(registry: TestRegistry) {
    register(&registry, "a1", &["plan"]);
    register(&registry, "a2", &["route"]);

    assert_eq!(registry.list(None).len(), 2);
    let planners = registry.list(Some(&Capability::new("plan").expect("valid")));
    assert_eq!(planners.len(), 1);
}
