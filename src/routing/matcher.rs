//! Marker matching for upstream path derivation.
//!
//! # Responsibilities
//! - Locate the marker segment (e.g. `/api/openai/`) in an inbound URL
//! - Return everything after it as the upstream path, query included
//!
//! # Design Decisions
//! - First occurrence wins: a marker repeated in the upstream path is kept
//! - Matching is case-sensitive, like path routing
//! - No regex; a plain substring search over the path and query

use axum::http::Uri;

/// Strips the inbound prefix up to and including a marker segment.
#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    marker: String,
}

impl MarkerMatcher {
    /// Create a matcher for the given mount path. The marker is the mount
    /// path with a trailing slash, so `/api/openai` matches `/api/openai/...`.
    pub fn new(mount_path: &str) -> Self {
        Self {
            marker: format!("{}/", mount_path.trim_end_matches('/')),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Remainder of `url` after the first marker, or None if it has no marker.
    pub fn strip<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.find(&self.marker)
            .map(|idx| &url[idx + self.marker.len()..])
    }

    /// Upstream path for an inbound request URI.
    pub fn upstream_path<'a>(&self, uri: &'a Uri) -> Option<&'a str> {
        let path_and_query = uri.path_and_query()?.as_str();
        self.strip(path_and_query)
    }
}
