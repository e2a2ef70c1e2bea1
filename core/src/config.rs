//! Client configuration: endpoint, timeouts, connection pool and proxy.
//!
//! # Design
//! Each bundle is plain data with defaults and fluent setters. Nothing is
//! validated; ports and durations are taken as given. `ClientConfig` can also
//! be loaded from JSON, where every duration is written in milliseconds.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_CONNECTIONS: usize = 200;
pub const DEFAULT_KEEP_ALIVE_MS: u64 = 1_000;
pub const DEFAULT_RETRY_COUNT: u32 = 0;

/// URL scheme of the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown schemes fall back to `Http`.
impl FromStr for Protocol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("https") {
            Ok(Protocol::Https)
        } else {
            Ok(Protocol::Http)
        }
    }
}

/// Same rules as `FromStr`: any case, unknown schemes become `Http`.
impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse::<Protocol>() {
            Ok(protocol) => Ok(protocol),
            Err(never) => match never {},
        }
    }
}

/// Username/password pair sent as HTTP Basic authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Network location every request is issued against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    protocol: Protocol,
    host: String,
    port: u16,
    base_path: String,
    credentials: Option<Credentials>,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_path: String::new(),
            credentials: None,
        }
    }
}

impl Endpoint {
    pub fn builder() -> EndpointBuilder {
        EndpointBuilder::default()
    }

    /// `protocol://host:port` followed by the base path, verbatim.
    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.protocol, self.host, self.port, self.base_path)
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

/// Fluent builder for [`Endpoint`]. A username without a password (or the
/// reverse) is completed with an empty string.
#[derive(Debug, Clone, Default)]
pub struct EndpointBuilder {
    endpoint: Endpoint,
    username: Option<String>,
    password: Option<String>,
}

impl EndpointBuilder {
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.endpoint.protocol = protocol;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.endpoint.port = port;
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.endpoint.base_path = base_path.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn build(self) -> Endpoint {
        let mut endpoint = self.endpoint;
        if self.username.is_some() || self.password.is_some() {
            endpoint.credentials = Some(Credentials {
                username: self.username.unwrap_or_default(),
                password: self.password.unwrap_or_default(),
            });
        }
        endpoint
    }
}

/// Per-client socket timeouts. There is no per-call override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(rename = "read_timeout_ms", with = "millis")]
    pub read: Duration,
    #[serde(rename = "write_timeout_ms", with = "millis")]
    pub write: Duration,
    #[serde(rename = "connect_timeout_ms", with = "millis")]
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from_millis(DEFAULT_TIMEOUT_MS, DEFAULT_TIMEOUT_MS, DEFAULT_TIMEOUT_MS)
    }
}

impl Timeouts {
    pub fn from_millis(read: u64, write: u64, connect: u64) -> Self {
        Self {
            read: Duration::from_millis(read),
            write: Duration::from_millis(write),
            connect: Duration::from_millis(connect),
        }
    }

    pub fn read(mut self, timeout: Duration) -> Self {
        self.read = timeout;
        self
    }

    pub fn write(mut self, timeout: Duration) -> Self {
        self.write = timeout;
        self
    }

    pub fn connect(mut self, timeout: Duration) -> Self {
        self.connect = timeout;
        self
    }
}

/// Connection pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    pub max_connections: usize,
    #[serde(rename = "keep_alive_ms", with = "millis")]
    pub keep_alive: Duration,
    /// Stored but never consulted: every call is dispatched exactly once.
    pub retry_count: u32,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            keep_alive: Duration::from_millis(DEFAULT_KEEP_ALIVE_MS),
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }
}

impl PoolOptions {
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }
}

/// HTTP proxy all requests are routed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Proxy {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Everything a client needs, frozen once the client is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    pub timeouts: Timeouts,
    pub pool: PoolOptions,
    pub proxy: Option<Proxy>,
}

impl ClientConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    /// Load a configuration from JSON. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn pool(mut self, pool: PoolOptions) -> Self {
        self.pool = pool;
        self
    }

    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
