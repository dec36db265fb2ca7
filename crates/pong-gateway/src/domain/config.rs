//! Gateway configuration with validation.

use pong_core::PingFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Which generation of the service to run
    pub mode: ServiceMode,
    /// Identity of this endpoint
    pub endpoint: EndpointConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Request limits
    pub limits: LimitsConfig,
    /// Ping queue configuration (parcel mode)
    pub queue: QueueConfig,
    /// Wire form of pings
    pub ping_format: PingFormat,
    /// HTTP sink for outgoing CloudEvents; in-process bus when absent
    pub event_sink: Option<String>,
    /// Vault key store; in-memory store when absent
    pub vault: Option<VaultConfig>,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == ServiceMode::Events && self.endpoint.id.trim().is_empty() {
            return Err(ConfigError::Missing("endpoint id"));
        }

        if self.limits.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size cannot be 0".into(),
            ));
        }

        if self.timeouts.request.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout cannot be 0".into(),
            ));
        }

        if self.timeouts.outbound.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "outbound timeout cannot be 0".into(),
            ));
        }

        if self.queue.capacity == 0 {
            return Err(ConfigError::InvalidLimit("queue capacity cannot be 0".into()));
        }

        if self.queue.max_attempts == 0 {
            return Err(ConfigError::InvalidLimit(
                "queue max_attempts cannot be 0".into(),
            ));
        }

        if let Some(vault) = &self.vault {
            if vault.url.trim().is_empty() {
                return Err(ConfigError::Missing("vault url"));
            }
            if vault.token.trim().is_empty() {
                return Err(ConfigError::Missing("vault token"));
            }
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// Generation of the pong service to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// Pings arrive as CloudEvents; pongs are emitted as CloudEvents.
    #[default]
    Events,
    /// Pings arrive as parcels and are queued; pongs are delivered to gateways.
    Parcels,
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Events => write!(f, "events"),
            Self::Parcels => write!(f, "parcels"),
        }
    }
}

impl FromStr for ServiceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "events" => Ok(Self::Events),
            "parcels" => Ok(Self::Parcels),
            other => Err(ConfigError::Invalid(format!("unknown mode '{other}'"))),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
        }
    }
}

/// Identity of this endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Endpoint id, the expected `ce-subject` of incoming events
    pub id: String,
    /// Internet host name parcels may be addressed to
    pub public_address: Option<String>,
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for handling one inbound request
    #[serde(with = "humantime_serde")]
    pub request: Duration,
    /// Budget for outbound calls (key store, gateways, event sink)
    #[serde(with = "humantime_serde")]
    pub outbound: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            outbound: Duration::from_secs(5),
        }
    }
}

/// Request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 8MiB, the largest parcel)
    pub max_request_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 8 * 1024 * 1024,
        }
    }
}

/// Ping queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Jobs the queue holds before refusing new ones
    pub capacity: usize,
    /// Processing attempts per job before it is abandoned
    pub max_attempts: u32,
    /// Delay before a failed job is retried
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            max_attempts: 3,
            retry_backoff: Duration::from_secs(5),
        }
    }
}

/// Vault KV v2 key store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault base URL
    pub url: String,
    /// Access token
    pub token: String,
    /// KV v2 mount
    pub kv_prefix: String,
}

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value is absent
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Parse durations written as `5s`, `500ms`, `2m` or plain seconds.
pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| "invalid milliseconds")
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| "invalid seconds")
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
            .ok_or("invalid minutes")
    } else {
        s.parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| "invalid duration format")
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
