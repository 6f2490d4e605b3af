//! Gateway connection settings.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the signed gateway client.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway API, without a trailing slash.
    pub api_url: String,

    /// Project identifier sent in every request body.
    pub project_id: String,

    /// Secret identifier sent as a header.
    pub secret_id: String,

    /// RSA private key: base64 DER (PKCS#8 or PKCS#1) or PEM.
    pub private_key: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: "https://lk.antilopay.com/api/v1".to_string(),
            project_id: String::new(),
            secret_id: String::new(),
            private_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_url", &self.api_url)
            .field("project_id", &self.project_id)
            .field("secret_id", &self.secret_id)
            .field("private_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_private_key() {
        let config = GatewayConfig {
            private_key: "c2VjcmV0".into(),
            ..Default::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("c2VjcmV0"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
