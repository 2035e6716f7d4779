//! Network foundation.
//!
//! Plain TCP listening is done by tokio directly; this module holds what the
//! TLS listener needs.

pub mod tls;

pub use tls::load_tls_config;
