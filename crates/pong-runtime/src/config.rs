//! # Runtime Configuration
//!
//! Builds the [`GatewayConfig`] from environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PONG_MODE` | `events` | `events` or `parcels` |
//! | `PONG_HTTP_HOST` | `0.0.0.0` | Bind address |
//! | `PONG_HTTP_PORT` | `8080` | Bind port |
//! | `PONG_ENDPOINT_ID` | required in events mode | Our endpoint id |
//! | `PONG_PUBLIC_ADDRESS` | unset | Internet host name parcels may be addressed to |
//! | `PONG_PING_FORMAT` | `json` | `json` or `binary` |
//! | `PONG_EVENT_SINK` | required in events mode | URL receiving outgoing CloudEvents |
//! | `PONG_REQUEST_TIMEOUT` | `30s` | Inbound request budget |
//! | `PONG_OUTBOUND_TIMEOUT` | `5s` | Outbound call budget |
//! | `PONG_MAX_REQUEST_SIZE` | `8388608` | Body limit in bytes |
//! | `PONG_QUEUE_CAPACITY` | `1000` | Ping queue size |
//! | `PONG_QUEUE_MAX_ATTEMPTS` | `3` | Attempts per ping job |
//! | `PONG_QUEUE_RETRY_BACKOFF` | `5s` | Delay between attempts |
//! | `VAULT_URL` / `VAULT_TOKEN` / `VAULT_KV_PREFIX` | unset | Vault key store |

use pong_gateway::domain::parse_duration;
use pong_gateway::{ConfigError, GatewayConfig, ServiceMode, VaultConfig};
use std::str::FromStr;
use std::time::Duration;

/// Load configuration from the process environment.
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    load_config_from(|name| std::env::var(name).ok())
}

/// Load configuration through `lookup`, then validate it.
pub fn load_config_from<F>(lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let mut config = GatewayConfig::default();

    if let Some(mode) = var("PONG_MODE") {
        config.mode = mode.parse()?;
    }
    if let Some(host) = var("PONG_HTTP_HOST") {
        config.http.host = parse("PONG_HTTP_HOST", &host)?;
    }
    if let Some(port) = var("PONG_HTTP_PORT") {
        config.http.port = parse("PONG_HTTP_PORT", &port)?;
    }

    if let Some(id) = var("PONG_ENDPOINT_ID") {
        config.endpoint.id = id;
    }
    config.endpoint.public_address = var("PONG_PUBLIC_ADDRESS");
    if let Some(format) = var("PONG_PING_FORMAT") {
        config.ping_format = format.parse().map_err(|_| {
            ConfigError::Invalid(format!("PONG_PING_FORMAT: unknown format '{format}'"))
        })?;
    }
    config.event_sink = var("PONG_EVENT_SINK");

    if let Some(timeout) = var("PONG_REQUEST_TIMEOUT") {
        config.timeouts.request = duration("PONG_REQUEST_TIMEOUT", &timeout)?;
    }
    if let Some(timeout) = var("PONG_OUTBOUND_TIMEOUT") {
        config.timeouts.outbound = duration("PONG_OUTBOUND_TIMEOUT", &timeout)?;
    }
    if let Some(size) = var("PONG_MAX_REQUEST_SIZE") {
        config.limits.max_request_size = parse("PONG_MAX_REQUEST_SIZE", &size)?;
    }

    if let Some(capacity) = var("PONG_QUEUE_CAPACITY") {
        config.queue.capacity = parse("PONG_QUEUE_CAPACITY", &capacity)?;
    }
    if let Some(attempts) = var("PONG_QUEUE_MAX_ATTEMPTS") {
        config.queue.max_attempts = parse("PONG_QUEUE_MAX_ATTEMPTS", &attempts)?;
    }
    if let Some(backoff) = var("PONG_QUEUE_RETRY_BACKOFF") {
        config.queue.retry_backoff = duration("PONG_QUEUE_RETRY_BACKOFF", &backoff)?;
    }

    if let Some(url) = var("VAULT_URL") {
        config.vault = Some(VaultConfig {
            url,
            token: var("VAULT_TOKEN").ok_or(ConfigError::Missing("VAULT_TOKEN"))?,
            kv_prefix: var("VAULT_KV_PREFIX").ok_or(ConfigError::Missing("VAULT_KV_PREFIX"))?,
        });
    }

    // The in-process bus has no consumer outside the process
    if config.mode == ServiceMode::Events && config.event_sink.is_none() {
        return Err(ConfigError::Missing("PONG_EVENT_SINK"));
    }

    config.validate()?;
    Ok(config)
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{name}: cannot parse '{value}'")))
}

fn duration(name: &str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).map_err(|e| ConfigError::InvalidTimeout(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pong_core::PingFormat;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config_from(|name| vars.get(name).cloned())
    }

    const SINK: (&str, &str) = ("PONG_EVENT_SINK", "http://broker.local/");

    #[test]
    fn test_events_mode_minimal() {
        let config = load(&[("PONG_ENDPOINT_ID", "0pong"), SINK]).unwrap();
        assert_eq!(config.mode, ServiceMode::Events);
        assert_eq!(config.endpoint.id, "0pong");
        assert_eq!(config.event_sink.as_deref(), Some("http://broker.local/"));
        assert_eq!(config.ping_format, PingFormat::Json);
        assert!(config.vault.is_none());
    }

    #[test]
    fn test_events_mode_requires_endpoint_id() {
        assert_eq!(load(&[SINK]).unwrap_err(), ConfigError::Missing("endpoint id"));
    }

    #[test]
    fn test_events_mode_requires_event_sink() {
        assert_eq!(
            load(&[("PONG_ENDPOINT_ID", "0pong")]).unwrap_err(),
            ConfigError::Missing("PONG_EVENT_SINK")
        );
    }

    #[test]
    fn test_parcels_mode_with_vault() {
        let config = load(&[
            ("PONG_MODE", "parcels"),
            ("PONG_PUBLIC_ADDRESS", "pong.example.com"),
            ("PONG_PING_FORMAT", "binary"),
            ("PONG_OUTBOUND_TIMEOUT", "750ms"),
            ("PONG_QUEUE_MAX_ATTEMPTS", "5"),
            ("VAULT_URL", "http://vault:8200"),
            ("VAULT_TOKEN", "root"),
            ("VAULT_KV_PREFIX", "pong-keys"),
        ])
        .unwrap();

        assert_eq!(config.mode, ServiceMode::Parcels);
        assert_eq!(config.endpoint.public_address.as_deref(), Some("pong.example.com"));
        assert_eq!(config.ping_format, PingFormat::Binary);
        assert_eq!(config.timeouts.outbound, Duration::from_millis(750));
        assert_eq!(config.queue.max_attempts, 5);
        assert_eq!(config.vault.unwrap().kv_prefix, "pong-keys");
    }

    #[test]
    fn test_vault_url_without_token() {
        let result = load(&[
            ("PONG_MODE", "parcels"),
            ("VAULT_URL", "http://vault:8200"),
            ("VAULT_KV_PREFIX", "pong-keys"),
        ]);
        assert_eq!(result.unwrap_err(), ConfigError::Missing("VAULT_TOKEN"));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(matches!(
            load(&[("PONG_ENDPOINT_ID", "0pong"), ("PONG_HTTP_PORT", "http")]),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(&[("PONG_ENDPOINT_ID", "0pong"), ("PONG_OUTBOUND_TIMEOUT", "soon")]),
            Err(ConfigError::InvalidTimeout(_))
        ));
        assert!(matches!(
            load(&[("PONG_MODE", "batch")]),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = load(&[("PONG_ENDPOINT_ID", "0pong"), SINK, ("PONG_PUBLIC_ADDRESS", " ")])
            .unwrap();
        assert!(config.endpoint.public_address.is_none());

        assert_eq!(
            load(&[("PONG_ENDPOINT_ID", "0pong"), ("PONG_EVENT_SINK", "  ")]).unwrap_err(),
            ConfigError::Missing("PONG_EVENT_SINK")
        );
    }
}
