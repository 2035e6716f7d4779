//! Startup errors.
//!
//! Request-time failures never reach this type; handlers turn them into
//! responses. Anything here aborts the process.

use thiserror::Error;

use crate::config::ConfigError;
use crate::security::access_control::ChainError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] ChainError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Invalid address {0:?}")]
    Address(String),
}
