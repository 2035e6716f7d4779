//! Configuration validation.
//!
//! Serde handles syntax; this pass checks meaning. Every problem is
//! reported, not just the first one.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::security::totp::MAX_WINDOW;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: mount path {value:?} must start with '/' and not end with '/'")]
    MountPath { field: &'static str, value: String },

    #[error("proxy and crud mount paths overlap ({0:?})")]
    MountConflict(String),

    #[error("{field}: {value:?} is not an http(s) URL")]
    Url { field: &'static str, value: String },

    #[error("auth.totp.digits must be between 6 and 8, got {0}")]
    Digits(u32),

    #[error("auth.totp.step_secs must be greater than zero")]
    Step,

    #[error("auth.totp.window must be at most 10, got {0}")]
    Window(u64),

    #[error("auth.totp.header {0:?} is not a valid header name")]
    HeaderName(String),

    #[error("auth: at least one of totp or session must be enabled")]
    NoStrategy,

    #[error("listener.tls: cert_path and key_path must be set")]
    TlsPaths,

    #[error("{field}: {value:?} is not a socket address")]
    Address { field: &'static str, value: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::TlsPaths);
        }
    }

    check_mount(&mut errors, "proxy.mount_path", &config.proxy.mount_path);
    check_mount(&mut errors, "crud.mount_path", &config.crud.mount_path);
    let (proxy, crud) = (&config.proxy.mount_path, &config.crud.mount_path);
    if proxy == crud
        || proxy.starts_with(&format!("{}/", crud))
        || crud.starts_with(&format!("{}/", proxy))
    {
        errors.push(ValidationError::MountConflict(proxy.clone()));
    }

    check_url(&mut errors, "proxy.upstream_url", &config.proxy.upstream_url);
    check_url(&mut errors, "crud.engine_url", &config.crud.engine_url);

    let totp = &config.auth.totp;
    let session = &config.auth.session;
    if totp.enabled {
        if !(6..=8).contains(&totp.digits) {
            errors.push(ValidationError::Digits(totp.digits));
        }
        if totp.step_secs == 0 {
            errors.push(ValidationError::Step);
        }
        if totp.window > MAX_WINDOW {
            errors.push(ValidationError::Window(totp.window));
        }
        if HeaderName::from_bytes(totp.header.as_bytes()).is_err() {
            errors.push(ValidationError::HeaderName(totp.header.clone()));
        }
    }
    if session.enabled {
        check_url(&mut errors, "auth.session.url", &session.url);
    }
    if !totp.enabled && !session.enabled {
        errors.push(ValidationError::NoStrategy);
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_mount(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') || value.ends_with('/') {
        errors.push(ValidationError::MountPath {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::Url {
            field,
            value: value.to_string(),
        });
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}
