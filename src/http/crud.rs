//! Gated CRUD handler.
//!
//! `crud_gate` runs the auth chain in front of the CRUD routes; only
//! authorized requests reach `crud_handler`, which hands them to the engine.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::request::request_id;
use crate::http::response::{json_message, unauthorized};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::access_control::Decision;

pub async fn crud_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let (mut parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();
    let method = parts.method.clone();

    let chain = state.gate.load_full();
    let response = match chain.authorize(&parts).await {
        Ok(Decision::Authorized(principal)) => {
            tracing::debug!(request_id = %request_id, principal = principal.kind(), "CRUD request authorized");
            parts.extensions.insert(principal);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(_) => {
            tracing::info!(request_id = %request_id, path = %parts.uri.path(), "CRUD request rejected");
            unauthorized()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Session lookup failed");
            json_message(StatusCode::INTERNAL_SERVER_ERROR, "Session lookup failed.")
        }
    };

    metrics::record_request("crud", method.as_str(), response.status().as_u16(), start_time);
    response
}

pub async fn crud_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    state.engine.handle(request).await
}
