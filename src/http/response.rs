//! Response relaying and gateway-generated responses.
//!
//! # Responsibilities
//! - Turn an upstream `reqwest::Response` into an axum response
//! - Stream the body through without buffering
//! - Build the gateway's own JSON error bodies
//!
//! # Design Decisions
//! - Status and end-to-end headers are relayed as-is
//! - Hop-by-hop headers are stripped; they describe the upstream connection

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use serde_json::json;

use crate::security::headers::strip_hop_by_hop;

/// Relay an upstream response to the client.
pub fn from_upstream(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Status for a request body that could not be read: 413 when it ran past
/// the size limit, 400 otherwise.
pub fn body_error_status(err: &axum::Error) -> StatusCode {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return StatusCode::PAYLOAD_TOO_LARGE;
        }
        source = e.source();
    }
    StatusCode::BAD_REQUEST
}

/// `{"message": ...}` with the given status.
pub fn json_message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// The CRUD gate's rejection.
pub fn unauthorized() -> Response {
    json_message(StatusCode::UNAUTHORIZED, "You must be logged in.")
}
