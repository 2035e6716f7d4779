//! Header hygiene.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers when relaying a message to another connection
//! - Name the headers that carry credentials, so traces redact them

use axum::http::{header, HeaderMap, HeaderName};

/// Headers that describe a single connection and must not be relayed.
static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Request headers that hold credentials.
pub fn credential_headers(totp_header: &str) -> Vec<HeaderName> {
    let mut names = vec![header::AUTHORIZATION, header::COOKIE];
    if let Ok(name) = HeaderName::from_bytes(totp_header.to_ascii_lowercase().as_bytes()) {
        names.push(name);
    }
    names
}
