//! Ordered authorization chain for the CRUD routes.
//!
//! Each strategy looks at the request and answers `Authorized`, `Denied` or
//! `NotApplicable`. Strategies run in order until one is decisive; a request
//! nobody claims is denied.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{request::Parts, HeaderName};
use secrecy::SecretString;

use crate::config::{AuthConfig, InvalidTotpPolicy};
use crate::observability::metrics;
use crate::security::session::{Session, SessionAuthority, SessionError};
use crate::security::totp::TotpVerifier;

/// Who let a request through. Attached to request extensions on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A valid one-time code was presented.
    Totp,
    /// The session authority recognised the caller.
    Session(Session),
}

impl Principal {
    pub fn kind(&self) -> &'static str {
        match self {
            Principal::Totp => "totp",
            Principal::Session(_) => "session",
        }
    }
}

/// Result of a single strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Authorized(Principal),
    Denied,
    NotApplicable,
}

impl Decision {
    fn is_decisive(&self) -> bool {
        !matches!(self, Decision::NotApplicable)
    }
}

/// One way of authorizing a request.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate(&self, parts: &Parts) -> Result<Decision, SessionError>;
}

/// Checks a one-time code carried in a request header.
pub struct TotpStrategy {
    header: HeaderName,
    verifier: TotpVerifier,
    on_invalid: InvalidTotpPolicy,
}

impl TotpStrategy {
    pub fn new(header: HeaderName, verifier: TotpVerifier, on_invalid: InvalidTotpPolicy) -> Self {
        Self {
            header,
            verifier,
            on_invalid,
        }
    }
}

#[async_trait]
impl AuthStrategy for TotpStrategy {
    fn name(&self) -> &'static str {
        "totp"
    }

    async fn evaluate(&self, parts: &Parts) -> Result<Decision, SessionError> {
        let Some(value) = parts.headers.get(&self.header).filter(|v| !v.is_empty()) else {
            tracing::debug!(header = %self.header, "No TOTP header");
            metrics::record_auth_decision(self.name(), "absent");
            return Ok(Decision::NotApplicable);
        };

        let valid = value
            .to_str()
            .map(|code| self.verifier.verify(code))
            .unwrap_or(false);

        if valid {
            metrics::record_auth_decision(self.name(), "authorized");
            return Ok(Decision::Authorized(Principal::Totp));
        }

        metrics::record_auth_decision(self.name(), "invalid");
        match self.on_invalid {
            InvalidTotpPolicy::Fallback => {
                tracing::warn!(header = %self.header, "Invalid TOTP code, falling back");
                Ok(Decision::NotApplicable)
            }
            InvalidTotpPolicy::Reject => {
                tracing::warn!(header = %self.header, "Invalid TOTP code, rejecting");
                Ok(Decision::Denied)
            }
        }
    }
}

/// Asks the session authority for a session.
pub struct SessionStrategy {
    authority: Arc<dyn SessionAuthority>,
}

impl SessionStrategy {
    pub fn new(authority: Arc<dyn SessionAuthority>) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl AuthStrategy for SessionStrategy {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn evaluate(&self, parts: &Parts) -> Result<Decision, SessionError> {
        match self.authority.resolve(parts).await {
            Ok(Some(session)) => {
                metrics::record_auth_decision(self.name(), "authorized");
                Ok(Decision::Authorized(Principal::Session(session)))
            }
            Ok(None) => {
                metrics::record_auth_decision(self.name(), "denied");
                Ok(Decision::Denied)
            }
            Err(e) => {
                metrics::record_auth_decision(self.name(), "error");
                Err(e)
            }
        }
    }
}

/// Errors building a chain from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("TOTP secret environment variable {0} is not set")]
    MissingSecret(String),

    #[error("invalid TOTP header name {0:?}")]
    HeaderName(String),
}

/// Strategies evaluated in order.
#[derive(Clone, Default)]
pub struct AuthChain {
    strategies: Vec<Arc<dyn AuthStrategy>>,
}

impl AuthChain {
    pub fn new(strategies: Vec<Arc<dyn AuthStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the TOTP-then-session chain described by `config`.
    ///
    /// The secret is looked up through `secret_for`, normally the process
    /// environment.
    pub fn from_config<F>(
        config: &AuthConfig,
        authority: Arc<dyn SessionAuthority>,
        secret_for: F,
    ) -> Result<Self, ChainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut strategies: Vec<Arc<dyn AuthStrategy>> = Vec::new();

        let totp = &config.totp;
        if totp.enabled {
            let secret = secret_for(&totp.secret_env)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ChainError::MissingSecret(totp.secret_env.clone()))?;
            let header = HeaderName::from_bytes(totp.header.to_ascii_lowercase().as_bytes())
                .map_err(|_| ChainError::HeaderName(totp.header.clone()))?;
            let verifier = TotpVerifier::from_config(SecretString::new(secret), totp);
            strategies.push(Arc::new(TotpStrategy::new(header, verifier, totp.on_invalid)));
        }

        if config.session.enabled {
            strategies.push(Arc::new(SessionStrategy::new(authority)));
        }

        Ok(Self::new(strategies))
    }

    /// Names of the strategies, in evaluation order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain. Never returns `NotApplicable`.
    pub async fn authorize(&self, parts: &Parts) -> Result<Decision, SessionError> {
        for strategy in &self.strategies {
            let decision = strategy.evaluate(parts).await?;
            if decision.is_decisive() {
                tracing::debug!(strategy = strategy.name(), denied = matches!(decision, Decision::Denied), "Authorization decided");
                return Ok(decision);
            }
        }
        Ok(Decision::Denied)
    }
}
