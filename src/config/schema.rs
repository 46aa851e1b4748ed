//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Caller authentication.
    pub auth: AuthConfig,

    /// Hosts the relay may forward to.
    pub targets: TargetsConfig,

    /// Outbound client settings.
    pub upstream: UpstreamConfig,

    /// Cross-origin policy applied to every response.
    pub cors: CorsConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Shared-secret authentication.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret every caller must present in `x-api-key`.
    /// When unset, every request is rejected.
    pub api_key: Option<String>,
}

/// Target whitelist.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TargetsConfig {
    /// Hostnames (exact match, no port) requests may be forwarded to.
    pub allowed_hosts: Vec<String>,
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total timeout for one upstream call. None means no explicit timeout.
    pub timeout_secs: Option<u64>,

    /// Connection establishment timeout.
    pub connect_timeout_secs: Option<u64>,

    /// Follow upstream redirects (up to 10 hops).
    pub follow_redirects: bool,

    /// Honor HTTP(S)_PROXY environment variables for outbound calls.
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            connect_timeout_secs: None,
            follow_redirects: true,
            system_proxy: true,
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the relay. Empty allows any origin.
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_secs: Some(600),
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Total time allowed for handling one inbound request, in seconds.
    /// None means the request runs until the upstream answers or fails.
    pub request_timeout_secs: Option<u64>,

    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.auth.api_key.is_none());
        assert!(config.targets.allowed_hosts.is_empty());
        assert!(config.upstream.timeout_secs.is_none());
        assert!(config.upstream.follow_redirects);
        assert!(config.limits.request_timeout_secs.is_none());
        assert_eq!(config.limits.max_body_size, 2 * 1024 * 1024);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [auth]
            api_key = "s3cret"

            [targets]
            allowed_hosts = ["api.example.com", "httpbin.org"]

            [upstream]
            timeout_secs = 15

            [limits]
            request_timeout_secs = 45
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.targets.allowed_hosts.len(), 2);
        assert_eq!(config.upstream.timeout_secs, Some(15));
        assert!(config.upstream.system_proxy);
        assert_eq!(config.cors.max_age_secs, Some(600));
        assert_eq!(config.limits.request_timeout_secs, Some(45));
    }
}
