//! Client configuration.

use memobridge_core::defaults;
use tracing::debug;

/// Configuration for [`MemosClient`](crate::MemosClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Total timeout per request in seconds.
    pub timeout_secs: u64,
    /// Skip TLS verification (self-hosted instances with self-signed certs).
    pub skip_tls_verify: bool,
    /// User agent header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            skip_tls_verify: false,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MEMOBRIDGE_TIMEOUT_SECS` | `100` | Request timeout |
    /// | `MEMOBRIDGE_SKIP_TLS_VERIFY` | `false` | Accept invalid certificates |
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("MEMOBRIDGE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::REQUEST_TIMEOUT_SECS)
            .max(1);

        let skip_tls_verify = std::env::var("MEMOBRIDGE_SKIP_TLS_VERIFY")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        debug!(timeout_secs, skip_tls_verify, "Loaded client config");

        Self {
            timeout_secs,
            skip_tls_verify,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }
}
