//! Completion API proxy handler.
//!
//! Strips the inbound URL through the marker, forwards method, body and the
//! `Authorization` header to the upstream, and relays whatever comes back.
//! No retries; a transport failure is a 502.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::GatewayConfig;
use crate::http::request::request_id;
use crate::http::response::{body_error_status, from_upstream};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{Resolution, UpstreamRoute};

/// Immutable proxy settings shared by every request.
pub struct ProxyState {
    pub route: UpstreamRoute,
    pub client: reqwest::Client,
    pub timeout: Option<Duration>,
    pub body_limit: usize,
}

impl ProxyState {
    pub fn new(config: &GatewayConfig, client: reqwest::Client) -> Self {
        Self {
            route: UpstreamRoute::new(&config.proxy.mount_path, &config.proxy.upstream_url),
            client,
            timeout: config.proxy.request_timeout_secs.map(Duration::from_secs),
            body_limit: config.security.max_body_size,
        }
    }
}

pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let proxy = &state.proxy;
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();
    let method = parts.method.clone();

    let url = match proxy.route.resolve(&parts.uri) {
        Resolution::Upstream(url) => url,
        Resolution::NoMatch => {
            tracing::warn!(request_id = %request_id, uri = %parts.uri, "No upstream path in URL");
            metrics::record_request("proxy", method.as_str(), 404, start_time);
            return (StatusCode::NOT_FOUND, "No upstream path").into_response();
        }
        Resolution::Invalid(e) => {
            tracing::warn!(request_id = %request_id, uri = %parts.uri, error = %e, "Invalid upstream URL");
            metrics::record_request("proxy", method.as_str(), 400, start_time);
            return (StatusCode::BAD_REQUEST, "Invalid upstream path").into_response();
        }
    };

    let body = match axum::body::to_bytes(body, proxy.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let status = body_error_status(&e);
            tracing::warn!(request_id = %request_id, error = %e, status = status.as_u16(), "Failed to read request body");
            metrics::record_request("proxy", method.as_str(), status.as_u16(), start_time);
            return (status, "Failed to read request body").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        upstream = %url,
        "Proxying request"
    );

    let mut outbound = proxy.client.request(method.clone(), url);
    if let Some(authorization) = parts.headers.get(header::AUTHORIZATION) {
        outbound = outbound.header(header::AUTHORIZATION, authorization.clone());
    }
    if !body.is_empty() {
        outbound = outbound.body(body);
    }
    if let Some(timeout) = proxy.timeout {
        outbound = outbound.timeout(timeout);
    }

    match outbound.send().await {
        Ok(response) => {
            metrics::record_request("proxy", method.as_str(), response.status().as_u16(), start_time);
            from_upstream(response)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_upstream_error("proxy");
            metrics::record_request("proxy", method.as_str(), 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
