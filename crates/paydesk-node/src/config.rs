//! Node configuration.

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use paydesk_gateway::GatewayConfig;
use paydesk_tracker::TrackerConfig;
use serde::{Deserialize, Serialize};

/// Everything the node needs at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address the HTTP API listens on.
    pub listen_addr: SocketAddr,

    pub gateway: GatewayConfig,

    pub tracker: TrackerConfig,

    /// Sheet-append endpoint. Sales are kept in memory when unset.
    pub ledger_url: Option<String>,

    /// Chat transport endpoint. Notifications are only logged when unset.
    pub notify_url: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            gateway: GatewayConfig::default(),
            tracker: TrackerConfig::default(),
            ledger_url: None,
            notify_url: None,
        }
    }
}

impl NodeConfig {
    /// Read configuration from `PAYDESK_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Unset keys keep their
    /// defaults; the gateway credentials are required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("{} must be set", key));

        let mut config = Self::default();

        if let Some(addr) = get("PAYDESK_LISTEN_ADDR") {
            config.listen_addr = parse("PAYDESK_LISTEN_ADDR", &addr)?;
        }

        if let Some(url) = get("PAYDESK_API_URL") {
            config.gateway.api_url = url;
        }
        config.gateway.project_id = require("PAYDESK_PROJECT_ID")?;
        config.gateway.secret_id = require("PAYDESK_SECRET_ID")?;
        config.gateway.private_key = require("PAYDESK_PRIVATE_KEY")?;
        if let Some(timeout) = get("PAYDESK_TIMEOUT_SECS") {
            config.gateway.timeout_secs = parse("PAYDESK_TIMEOUT_SECS", &timeout)?;
        }

        if let Some(interval) = get("PAYDESK_POLL_INTERVAL_MS") {
            config.tracker.poll_interval_ms = parse("PAYDESK_POLL_INTERVAL_MS", &interval)?;
        }
        if let Some(attempts) = get("PAYDESK_MAX_ATTEMPTS") {
            config.tracker.max_attempts = parse("PAYDESK_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(capacity) = get("PAYDESK_QUEUE_CAPACITY") {
            config.tracker.queue_capacity = parse("PAYDESK_QUEUE_CAPACITY", &capacity)?;
        }

        config.ledger_url = get("PAYDESK_LEDGER_URL");
        config.notify_url = get("PAYDESK_NOTIFY_URL");

        Ok(config)
    }
}

fn parse<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value for {}: {:?}", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const CREDENTIALS: [(&str, &str); 3] = [
        ("PAYDESK_PROJECT_ID", "proj"),
        ("PAYDESK_SECRET_ID", "secret"),
        ("PAYDESK_PRIVATE_KEY", "a2V5"),
    ];

    #[test]
    fn test_defaults_with_credentials() {
        let config = NodeConfig::from_lookup(lookup(&CREDENTIALS)).unwrap();
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.gateway.project_id, "proj");
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.tracker.poll_interval_ms, 30_000);
        assert_eq!(config.tracker.max_attempts, 20);
        assert!(config.ledger_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.extend([
            ("PAYDESK_LISTEN_ADDR", "127.0.0.1:8080"),
            ("PAYDESK_MAX_ATTEMPTS", "5"),
            ("PAYDESK_LEDGER_URL", "http://sheets.local/append"),
            ("PAYDESK_NOTIFY_URL", "  "),
        ]);
        let config = NodeConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.tracker.max_attempts, 5);
        assert_eq!(config.ledger_url.as_deref(), Some("http://sheets.local/append"));
        assert!(config.notify_url.is_none());
    }

    #[test]
    fn test_missing_credentials_and_bad_numbers() {
        let err = NodeConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("PAYDESK_PROJECT_ID"));

        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("PAYDESK_POLL_INTERVAL_MS", "soon"));
        let err = NodeConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("PAYDESK_POLL_INTERVAL_MS"));
    }
}
