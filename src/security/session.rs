//! Session resolution through an external session authority.
//!
//! The gateway never interprets cookies itself. It forwards them to the
//! authority's session endpoint and reads back either a session object or an
//! empty body.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, request::Parts};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The user attached to a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// An authenticated session as reported by the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<SessionUser>,
    /// Expiry as reported by the authority (ISO 8601).
    pub expires: Option<String>,
}

/// Errors from the session authority.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session authority unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("session authority returned status {0}")]
    Status(u16),

    #[error("session authority returned malformed body: {0}")]
    Body(#[from] serde_json::Error),
}

/// Resolves an inbound request to a session, if one exists.
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    async fn resolve(&self, parts: &Parts) -> Result<Option<Session>, SessionError>;
}

/// Session authority reached over HTTP, NextAuth style.
///
/// `GET <url>` with the inbound `Cookie` header; a non-empty JSON object is a
/// session, `{}` or `null` is none.
pub struct HttpSessionAuthority {
    client: reqwest::Client,
    url: String,
    timeout: Option<Duration>,
}

impl HttpSessionAuthority {
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SessionAuthority for HttpSessionAuthority {
    async fn resolve(&self, parts: &Parts) -> Result<Option<Session>, SessionError> {
        let Some(cookie) = parts.headers.get(header::COOKIE) else {
            return Ok(None);
        };

        let mut request = self
            .client
            .get(&self.url)
            .header(header::COOKIE, cookie.clone())
            .header(header::ACCEPT, "application/json");
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_session(&body)
    }
}

/// Interpret a session endpoint body.
pub fn parse_session(body: &[u8]) -> Result<Option<Session>, SessionError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_slice(body)?;
    match value {
        serde_json::Value::Object(ref map) if !map.is_empty() => {
            Ok(Some(serde_json::from_value(value)?))
        }
        _ => Ok(None),
    }
}
