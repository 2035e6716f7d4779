//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, trace span)
//!     → proxy.rs  (/api/openai/*: rewrite path, forward Authorization)
//!       crud.rs   (/api/rest/*: auth chain, then CRUD engine)
//!     → response.rs (relay upstream response, JSON errors)
//!     → Send to client
//! ```

pub mod crud;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, Components, HttpServer};
