//! Routing subsystem for the completion proxy.
//!
//! # Data Flow
//! ```text
//! Inbound URI (path + query)
//!     → matcher.rs (strip through the marker segment)
//!     → router.rs (join remainder onto the upstream base)
//!     → Return: upstream URL or NoMatch
//! ```
//!
//! # Design Decisions
//! - Built once at startup, immutable at runtime
//! - Deterministic: same input always yields the same upstream URL

pub mod matcher;
pub mod router;

pub use matcher::MarkerMatcher;
pub use router::{Resolution, UpstreamRoute};
