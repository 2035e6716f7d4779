//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Request to a CRUD route:
//!     → access_control.rs (ordered auth chain)
//!         → totp.rs    (one-time code in a header)
//!         → session.rs (external session authority)
//!     → Authorized: principal attached, request delegated
//!     → Denied: 401
//!
//! Any relayed message:
//!     → headers.rs (strip hop-by-hop, redact credentials in traces)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a request no strategy claims is denied
//! - Secrets come from the environment and are never logged

pub mod access_control;
pub mod headers;
pub mod session;
pub mod totp;

pub use access_control::{AuthChain, AuthStrategy, Decision, Principal};
pub use session::{HttpSessionAuthority, Session, SessionAuthority, SessionError};
pub use totp::TotpVerifier;
