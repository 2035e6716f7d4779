//! Upstream target resolution.
//!
//! # Responsibilities
//! - Combine the configured upstream base with a derived upstream path
//! - Return an explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - The base may carry its own path prefix; the remainder is appended to it

use axum::http::Uri;
use url::Url;

use crate::routing::matcher::MarkerMatcher;

/// Outcome of resolving an inbound URI against the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Forward to this URL.
    Upstream(Url),
    /// The URI does not contain the marker.
    NoMatch,
    /// The joined URL does not parse.
    Invalid(String),
}

/// Maps inbound URIs under a mount path onto an upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamRoute {
    matcher: MarkerMatcher,
    base: String,
}

impl UpstreamRoute {
    pub fn new(mount_path: &str, upstream_url: &str) -> Self {
        Self {
            matcher: MarkerMatcher::new(mount_path),
            base: upstream_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve(&self, uri: &Uri) -> Resolution {
        let Some(remainder) = self.matcher.upstream_path(uri) else {
            return Resolution::NoMatch;
        };
        let joined = format!("{}/{}", self.base, remainder);
        match Url::parse(&joined) {
            Ok(url) => Resolution::Upstream(url),
            Err(e) => Resolution::Invalid(e.to_string()),
        }
    }
}
