//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds the auth chain and swaps it in atomically
//! ```
//!
//! Secrets never live in the file. The TOTP secret is read from the
//! environment variable named by `auth.totp.secret_env`.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, CrudConfig, GatewayConfig, InvalidTotpPolicy, ListenerConfig, LogFormat,
    ObservabilityConfig, ProxyConfig, SecurityConfig, SessionConfig, TimeoutConfig, TlsConfig,
    TotpConfig,
};
