//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// AI completion proxy settings.
    pub proxy: ProxyConfig,

    /// Gated CRUD handler settings.
    pub crud: CrudConfig,

    /// Authorization chain for the CRUD handler.
    pub auth: AuthConfig,

    /// Outbound connection settings shared by every upstream.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
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
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Completion API proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Mount path. The marker segment is this path plus a trailing slash.
    pub mount_path: String,

    /// Upstream base URL the remainder of the path is appended to.
    pub upstream_url: String,

    /// Total request timeout in seconds. None waits indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            mount_path: "/api/openai".to_string(),
            upstream_url: "https://api.openai.com".to_string(),
            request_timeout_secs: None,
        }
    }
}

/// CRUD engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CrudConfig {
    /// Mount path for the gated CRUD routes.
    pub mount_path: String,

    /// Base URL of the CRUD engine.
    pub engine_url: String,

    pub request_timeout_secs: Option<u64>,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            mount_path: "/api/rest".to_string(),
            engine_url: "http://127.0.0.1:3001".to_string(),
            request_timeout_secs: None,
        }
    }
}

/// Authorization chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub totp: TotpConfig,
    pub session: SessionConfig,
}

/// What the TOTP strategy does with a header that is present but wrong.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvalidTotpPolicy {
    /// Defer to the next strategy, as if no header had been sent.
    #[default]
    Fallback,
    /// Deny the request outright.
    Reject,
}

/// TOTP strategy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TotpConfig {
    pub enabled: bool,

    /// Request header carrying the code.
    pub header: String,

    /// Environment variable holding the shared secret.
    pub secret_env: String,

    /// Code length (6-8).
    pub digits: u32,

    /// Time step in seconds.
    pub step_secs: u64,

    /// Accepted steps before and after the current one (at most 10).
    pub window: u64,

    pub on_invalid: InvalidTotpPolicy,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header: "totp".to_string(),
            secret_env: "REST_TOTP_SECRET".to_string(),
            digits: 6,
            step_secs: 30,
            window: 0,
            on_invalid: InvalidTotpPolicy::Fallback,
        }
    }
}

/// Session authority configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub enabled: bool,

    /// Endpoint returning the session for the forwarded cookies.
    pub url: String,

    pub timeout_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://127.0.0.1:3000/api/auth/session".to_string(),
            timeout_secs: None,
        }
    }
}

/// Outbound connection settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// How long idle pooled connections are kept, in seconds.
    pub pool_idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            pool_idle_secs: 90,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}
