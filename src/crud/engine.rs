//! The CRUD engine seam and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, Request, StatusCode},
    response::Response,
};

use crate::http::request::request_id;
use crate::http::response::{body_error_status, from_upstream, json_message};
use crate::observability::metrics;
use crate::security::headers::strip_hop_by_hop;

/// Consumes an authorized request and produces the response.
#[async_trait]
pub trait CrudEngine: Send + Sync {
    async fn handle(&self, request: Request<Body>) -> Response;

    /// Release held resources. Called once after the server has drained.
    async fn shutdown(&self) {}
}

/// Forwards requests to an external CRUD engine over a pooled client.
///
/// The mount prefix is stripped, so `/api/rest/users?take=5` becomes
/// `<engine_url>/users?take=5`.
pub struct UpstreamCrudEngine {
    client: reqwest::Client,
    mount_path: String,
    base: String,
    timeout: Option<Duration>,
    body_limit: usize,
    totp_header: Option<HeaderName>,
}

impl UpstreamCrudEngine {
    pub fn new(client: reqwest::Client, mount_path: &str, engine_url: &str) -> Self {
        Self {
            client,
            mount_path: mount_path.trim_end_matches('/').to_string(),
            base: engine_url.trim_end_matches('/').to_string(),
            timeout: None,
            body_limit: usize::MAX,
            totp_header: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Largest request body read before forwarding.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Header holding the one-time code; it is not passed to the engine.
    pub fn with_totp_header(mut self, header: &str) -> Self {
        self.totp_header = HeaderName::from_bytes(header.to_ascii_lowercase().as_bytes()).ok();
        self
    }

    /// Engine URL for an inbound path and query.
    pub fn engine_url(&self, path_and_query: &str) -> String {
        let rest = path_and_query
            .strip_prefix(&self.mount_path)
            .unwrap_or(path_and_query);
        if rest.is_empty() || rest.starts_with('?') {
            format!("{}/{}", self.base, rest)
        } else {
            format!("{}{}", self.base, rest)
        }
    }

    fn outbound_headers(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut headers = inbound.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        if let Some(name) = &self.totp_header {
            headers.remove(name);
        }
        headers
    }
}

#[async_trait]
impl CrudEngine for UpstreamCrudEngine {
    async fn handle(&self, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        let request_id = request_id(&parts.headers).to_string();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.engine_url(path_and_query);

        let body = match axum::body::to_bytes(body, self.body_limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let status = body_error_status(&e);
                tracing::warn!(request_id = %request_id, error = %e, status = status.as_u16(), "Failed to read request body");
                return json_message(status, "Failed to read request body.");
            }
        };

        let mut outbound = self
            .client
            .request(parts.method.clone(), &url)
            .headers(self.outbound_headers(&parts.headers));
        if !body.is_empty() {
            outbound = outbound.body(body);
        }
        if let Some(timeout) = self.timeout {
            outbound = outbound.timeout(timeout);
        }

        match outbound.send().await {
            Ok(response) => from_upstream(response),
            Err(e) => {
                tracing::error!(request_id = %request_id, url = %url, error = %e, "CRUD engine request failed");
                metrics::record_upstream_error("crud");
                json_message(StatusCode::BAD_GATEWAY, "CRUD engine unavailable.")
            }
        }
    }

    async fn shutdown(&self) {
        tracing::info!(engine = %self.base, "CRUD engine client released");
    }
}
