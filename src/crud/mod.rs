//! CRUD engine integration.
//!
//! The gateway does not generate CRUD routes. Authorized requests are handed
//! to a `CrudEngine`; the default one forwards to an external engine that
//! owns routing, filtering and persistence.

pub mod engine;

pub use engine::{CrudEngine, UpstreamCrudEngine};
