//! Server configuration.
//!
//! [`ServerConfig`] is read from TOML, then environment overrides are
//! applied, then the result is validated. Every section and key has a
//! default, so an empty file (or no file at all) yields a working server.

mod error;
mod source;


pub use error::ConfigError;
pub use source::{CONFIG_PATH_ENV, ConfigSource, DEFAULT_CONFIG_FILE};

use crate::envelope::codec::DEFAULT_MAX_MESSAGE_BYTES;
use crate::envelope::domain::AgentId;
use crate::retry::RetryPolicy;
use crate::router::{domain::SelectionPolicy, services::RouterSettings};
use crate::session::services::SessionSettings;
use crate::spatial::{adapters::TableName, domain::Crs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Transport used for agent connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// One envelope per WebSocket text frame.
    #[default]
    Websocket,
    /// Four-byte big-endian length prefix, then the JSON payload.
    Tcp,
}

impl TransportKind {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Websocket => "websocket",
            Self::Tcp => "tcp",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Some(Self::Websocket),
            "tcp" => Some(Self::Tcp),
            _ => None,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handshake credential policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Every agent may register.
    #[default]
    AllowAll,
    /// Agents must present the token configured for their id.
    StaticTokens,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address for both listeners.
    pub host: String,
    /// Agent transport port. `0` picks a free port.
    pub port: u16,
    /// Agent transport.
    pub transport: TransportKind,
    /// Health surface port. `0` picks a free port.
    pub health_port: u16,
    /// Largest accepted inbound payload.
    pub max_message_bytes: usize,
    /// Time a new connection has to complete `agent.register`.
    pub handshake_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
            transport: TransportKind::default(),
            health_port: 8081,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            handshake_timeout_ms: 10_000,
        }
    }
}

/// Heartbeat policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LivenessSection {
    /// Silence after which an agent is `degraded`; twice this expires it.
    pub heartbeat_interval_ms: u64,
    /// Period of the shared background sweep.
    pub sweep_interval_ms: u64,
}

impl Default for LivenessSection {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 15_000,
            sweep_interval_ms: 1_000,
        }
    }
}

/// Forwarding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterSection {
    /// Deadline for every forwarded request.
    pub call_timeout_ms: u64,
    /// Holder selection among capability holders.
    pub selection_policy: SelectionPolicy,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            call_timeout_ms: 30_000,
            selection_policy: SelectionPolicy::default(),
        }
    }
}

/// Knowledge graph gateway settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphSection {
    /// Caches `graph.queryNeighbors` results.
    pub cache_enabled: bool,
    /// Maximum cached neighborhoods.
    pub cache_capacity: u64,
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            cache_capacity: 10_000,
        }
    }
}

/// Spatial gateway settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpatialSection {
    /// Coordinate reference systems the gateway serves.
    pub supported_crs: Vec<Crs>,
    /// PostGIS connection string. Unset selects the in-memory store.
    pub database_url: Option<String>,
    /// Table holding the point features.
    pub table: String,
    /// CRS the table's geometries are stored in.
    pub table_crs: Crs,
    /// Connection pool size.
    pub pool_size: u32,
    /// Longest wait for a pooled connection.
    pub pool_wait_ms: u64,
}

impl Default for SpatialSection {
    fn default() -> Self {
        Self {
            supported_crs: vec![Crs::WGS84, Crs::WEB_MERCATOR],
            database_url: None,
            table: TableName::default().as_str().to_owned(),
            table_crs: Crs::WGS84,
            pool_size: 8,
            pool_wait_ms: 2_000,
        }
    }
}

impl fmt::Debug for SpatialSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialSection")
            .field("supported_crs", &self.supported_crs)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("table", &self.table)
            .field("table_crs", &self.table_crs)
            .field("pool_size", &self.pool_size)
            .field("pool_wait_ms", &self.pool_wait_ms)
            .finish()
    }
}

/// Store retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay.
    pub max_backoff_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 50,
            max_backoff_ms: 1_000,
        }
    }
}

/// Handshake credential settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    /// Verifier selection.
    pub mode: AuthMode,
    /// Agent id → token, used by [`AuthMode::StaticTokens`].
    pub tokens: BTreeMap<String, String>,
}

impl fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSection")
            .field("mode", &self.mode)
            .field("tokens", &self.tokens.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::default(),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listener settings.
    pub server: ServerSection,
    /// Heartbeat policy.
    pub liveness: LivenessSection,
    /// Forwarding policy.
    pub router: RouterSection,
    /// Knowledge graph gateway settings.
    pub graph: GraphSection,
    /// Spatial gateway settings.
    pub spatial: SpatialSection,
    /// Store retry budget.
    pub retry: RetrySection,
    /// Handshake credential settings.
    pub auth: AuthSection,
    /// Logging settings.
    pub logging: LoggingSection,
}

impl ServerConfig {
    /// Parses configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML for
    /// this structure.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: "<inline>".into(),
            source: Box::new(source),
        })
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Environment`] when a numeric or enumerated
    /// override cannot be parsed.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("A2A_HOST") {
            self.server.host = host;
        }
        if let Some(raw) = lookup("A2A_PORT") {
            self.server.port = parse_port("A2A_PORT", raw)?;
        }
        if let Some(raw) = lookup("A2A_HEALTH_PORT") {
            self.server.health_port = parse_port("A2A_HEALTH_PORT", raw)?;
        }
        if let Some(raw) = lookup("A2A_TRANSPORT") {
            self.server.transport =
                TransportKind::parse(&raw).ok_or(ConfigError::Environment {
                    key: "A2A_TRANSPORT",
                    value: raw,
                })?;
        }
        if let Some(url) = lookup("A2A_DATABASE_URL") {
            self.spatial.database_url = Some(url).filter(|value| !value.trim().is_empty());
        }
        if let Some(level) = lookup("A2A_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("server.max_message_bytes", self.server.max_message_bytes)?;
        require_positive("server.handshake_timeout_ms", self.server.handshake_timeout_ms)?;
        require_positive(
            "liveness.heartbeat_interval_ms",
            self.liveness.heartbeat_interval_ms,
        )?;
        require_positive("liveness.sweep_interval_ms", self.liveness.sweep_interval_ms)?;
        require_positive("router.call_timeout_ms", self.router.call_timeout_ms)?;
        require_positive("spatial.pool_size", self.spatial.pool_size)?;
        require_positive("spatial.pool_wait_ms", self.spatial.pool_wait_ms)?;

        if self.server.host.trim().is_empty() {
            return Err(ConfigError::invalid("server.host", "must not be empty"));
        }
        if self.server.port != 0 && self.server.port == self.server.health_port {
            return Err(ConfigError::invalid(
                "server.health_port",
                "must differ from server.port",
            ));
        }
        if self.graph.cache_enabled && self.graph.cache_capacity == 0 {
            return Err(ConfigError::invalid(
                "graph.cache_capacity",
                "must be positive when the cache is enabled",
            ));
        }
        if self.spatial.supported_crs.is_empty() {
            return Err(ConfigError::invalid(
                "spatial.supported_crs",
                "at least one CRS is required",
            ));
        }
        if !self.spatial.supported_crs.contains(&self.spatial.table_crs) {
            return Err(ConfigError::invalid(
                "spatial.table_crs",
                "must be one of spatial.supported_crs",
            ));
        }
        self.table_name()?;
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::invalid(
                "retry.initial_backoff_ms",
                "must not exceed retry.max_backoff_ms",
            ));
        }
        self.static_tokens()?;
        Ok(())
    }

    /// Returns the validated spatial table name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for names that are not plain SQL
    /// identifiers.
    pub fn table_name(&self) -> Result<TableName, ConfigError> {
        TableName::new(self.spatial.table.as_str())
            .map_err(|err| ConfigError::invalid("spatial.table", err.to_string()))
    }

    /// Returns the configured `(agent, token)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an agent id is malformed or
    /// static tokens are selected without any token.
    pub fn static_tokens(&self) -> Result<Vec<(AgentId, String)>, ConfigError> {
        if self.auth.mode == AuthMode::StaticTokens && self.auth.tokens.is_empty() {
            return Err(ConfigError::invalid(
                "auth.tokens",
                "static_tokens mode needs at least one token",
            ));
        }
        self.auth
            .tokens
            .iter()
            .map(|(agent, token)| {
                AgentId::new(agent.as_str())
                    .map(|id| (id, token.clone()))
                    .map_err(|err| ConfigError::invalid("auth.tokens", err.to_string()))
            })
            .collect()
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.liveness.heartbeat_interval_ms)
    }

    /// Returns the router settings.
    #[must_use]
    pub const fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            call_timeout: Duration::from_millis(self.router.call_timeout_ms),
            selection_policy: self.router.selection_policy,
        }
    }

    /// Returns the session timing.
    #[must_use]
    pub const fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            handshake_timeout: Duration::from_millis(self.server.handshake_timeout_ms),
            sweep_interval: Duration::from_millis(self.liveness.sweep_interval_ms),
        }
    }

    /// Returns the store retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            Duration::from_millis(self.retry.initial_backoff_ms),
            Duration::from_millis(self.retry.max_backoff_ms),
        )
    }

    /// Returns the longest wait for a pooled spatial connection.
    #[must_use]
    pub const fn pool_wait(&self) -> Duration {
        Duration::from_millis(self.spatial.pool_wait_ms)
    }
}

fn parse_port(key: &'static str, raw: String) -> Result<u16, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Environment { key, value: raw })
}

fn require_positive<T>(field: &'static str, value: T) -> Result<(), ConfigError>
where
    T: Default + PartialEq,
{
    if value == T::default() {
        return Err(ConfigError::invalid(field, "must be positive"));
    }
    Ok(())
}
