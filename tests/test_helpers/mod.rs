//! Shared harness for integration tests.
//!
//! [`Harness`] wires a [`ServerContext`] over in-memory stores and a
//! [`ManualClock`], so deadline and liveness sweeps run on demand.

use agora::config::ServerConfig;
use agora::envelope::domain::{AgentId, Envelope, ErrorCode};
use agora::graph::{adapters::InMemoryGraphStore, ports::GraphStore};
use agora::registry::adapters::RecordingConnection;
use agora::server::ServerContext;
use agora::session::{
    adapters::AllowAllVerifier,
    ports::CredentialVerifier,
    services::{Session, SessionStep, SweepReport},
};
use agora::spatial::{
    adapters::InMemorySpatialStore,
    domain::{Crs, Point, SpatialFeature},
    ports::SpatialStore,
};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        )
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Context type used across integration tests.
pub type TestContext = ServerContext<ManualClock>;

/// Point features around `[10, 20]` in WGS 84, nearest first: p1, p2, p3, p4.
pub fn seeded_features() -> Vec<SpatialFeature> {
    vec![
        SpatialFeature::new("p3", Point::new(10.3, 20.0), Crs::WGS84)
            .with_attribute("name", json!("third")),
        SpatialFeature::new("p1", Point::new(10.0, 20.0), Crs::WGS84)
            .with_attribute("name", json!("first")),
        SpatialFeature::new("p4", Point::new(12.0, 20.0), Crs::WGS84),
        SpatialFeature::new("p2", Point::new(10.1, 20.0), Crs::WGS84),
    ]
}

/// A server context plus the clock driving it.
pub struct Harness {
    /// Context under test.
    pub context: Arc<TestContext>,
    /// Clock shared by every component.
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Builds a harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Builds a harness with the given configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let graph_store: Arc<dyn GraphStore> = Arc::new(InMemoryGraphStore::new());
        let spatial_store: Arc<dyn SpatialStore> =
            Arc::new(InMemorySpatialStore::with_features(seeded_features()));
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(AllowAllVerifier);
        let context = Arc::new(ServerContext::assemble(
            config,
            Arc::clone(&clock),
            graph_store,
            spatial_store,
            verifier,
        ));
        Self { context, clock }
    }

    /// Opens a session that has not registered yet.
    pub fn open(&self) -> TestAgent {
        let connection = RecordingConnection::new();
        let session = self
            .context
            .supervisor()
            .open(Arc::new(connection.clone()));
        TestAgent {
            session,
            connection,
            next_id: 100,
        }
    }

    /// Opens a session and completes `agent.register`.
    pub async fn connect(&self, id: &str, capabilities: &[&str]) -> TestAgent {
        let mut agent = self.open();
        let step = agent
            .request(
                "agent.register",
                json!({"agent_id": id, "capabilities": capabilities}),
            )
            .await;
        assert_eq!(step, SessionStep::Continue, "register {id}");
        let reply = agent.take_one();
        assert!(reply.rpc_error().is_none(), "register {id} failed: {reply:?}");
        agent
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        self.clock.advance(delta);
    }

    /// Runs the heartbeat and deadline sweeps at the current time.
    pub fn sweep(&self) -> SweepReport {
        self.context.supervisor().sweep(self.clock.utc())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// One connected agent driven directly through its session.
pub struct TestAgent {
    /// Session under test.
    pub session: Session<ManualClock>,
    /// Outbound side of the connection.
    pub connection: RecordingConnection,
    next_id: i64,
}

impl TestAgent {
    /// Sends a raw JSON value through the session.
    pub async fn send(&mut self, message: &Value) -> SessionStep {
        self.session.receive(message.to_string().as_bytes()).await
    }

    /// Sends a request with a fresh numeric id and returns the step.
    pub async fn request(&mut self, method: &str, params: Value) -> SessionStep {
        self.next_id += 1;
        let id = self.next_id;
        self.send(&json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await
    }

    /// Returns the id used by the last [`TestAgent::request`].
    pub const fn last_id(&self) -> i64 {
        self.next_id
    }

    /// Returns the agent id after registration.
    pub fn id(&self) -> Option<&AgentId> {
        self.session.agent_id()
    }

    /// Removes every delivered envelope.
    pub fn take(&self) -> Vec<Envelope> {
        self.connection.drain()
    }

    /// Removes exactly one delivered envelope.
    pub fn take_one(&self) -> Envelope {
        let mut delivered = self.take();
        assert_eq!(delivered.len(), 1, "expected one envelope, got {delivered:?}");
        delivered.remove(0)
    }

    /// Waits for the next envelope, for replies produced by spawned tasks.
    pub async fn next(&self) -> Envelope {
        for _ in 0..400 {
            if let Some(envelope) = self.take().into_iter().next() {
                return envelope;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no envelope delivered");
    }
}

/// Returns the taxonomy code of an error envelope.
pub fn error_code(envelope: &Envelope) -> Option<ErrorCode> {
    envelope.rpc_error().and_then(|error| error.error_code())
}
