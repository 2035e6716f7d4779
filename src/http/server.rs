//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the process-wide pooled client and the external collaborators
//! - Create the Axum Router: proxy mount, gated CRUD mount
//! - Wire up middleware (request id, sensitive headers, tracing, body limit)
//! - Serve plain TCP or TLS until the shutdown signal
//! - Apply configuration reloads to the auth chain

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{middleware, routing::any, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::crud::{CrudEngine, UpstreamCrudEngine};
use crate::error::GatewayError;
use crate::http::crud::{crud_gate, crud_handler};
use crate::http::proxy::{proxy_handler, ProxyState};
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::security::access_control::{AuthChain, ChainError};
use crate::security::headers::credential_headers;
use crate::security::session::{HttpSessionAuthority, SessionAuthority};

/// How long TLS connections get to finish after shutdown is signalled.
const TLS_DRAIN: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyState>,
    pub gate: Arc<ArcSwap<AuthChain>>,
    pub engine: Arc<dyn CrudEngine>,
}

/// The collaborators a server is built from.
pub struct Components {
    /// Pooled client shared by the proxy and the default collaborators.
    pub client: reqwest::Client,
    pub session_authority: Arc<dyn SessionAuthority>,
    pub engine: Arc<dyn CrudEngine>,
}

impl Components {
    /// Build the pooled client and the HTTP-backed collaborators.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .pool_idle_timeout(Duration::from_secs(config.timeouts.pool_idle_secs))
            .build()?;

        let session_authority = Arc::new(HttpSessionAuthority::new(
            client.clone(),
            config.auth.session.url.clone(),
            config.auth.session.timeout_secs.map(Duration::from_secs),
        ));

        let engine = UpstreamCrudEngine::new(client.clone(), &config.crud.mount_path, &config.crud.engine_url)
            .with_timeout(config.crud.request_timeout_secs.map(Duration::from_secs))
            .with_body_limit(config.security.max_body_size)
            .with_totp_header(&config.auth.totp.header);

        Ok(Self {
            client,
            session_authority,
            engine: Arc::new(engine),
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
    session_authority: Arc<dyn SessionAuthority>,
}

impl HttpServer {
    /// Create a server with HTTP-backed collaborators.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let components = Components::from_config(&config)?;
        Ok(Self::with_components(config, components)?)
    }

    /// Create a server from explicit collaborators.
    pub fn with_components(config: GatewayConfig, components: Components) -> Result<Self, ChainError> {
        let chain = AuthChain::from_config(
            &config.auth,
            components.session_authority.clone(),
            env_secret,
        )?;
        tracing::info!(strategies = ?chain.strategy_names(), "Auth chain ready");

        let state = AppState {
            proxy: Arc::new(ProxyState::new(&config, components.client)),
            gate: Arc::new(ArcSwap::from_pointee(chain)),
            engine: components.engine,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
            session_authority: components.session_authority,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let crud_mount = &config.crud.mount_path;
        let crud_routes = Router::new()
            .route(crud_mount, any(crud_handler))
            .route(&format!("{}/{{*path}}", crud_mount), any(crud_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), crud_gate));

        Router::new()
            .route(&format!("{}/{{*path}}", config.proxy.mount_path), any(proxy_handler))
            .merge(crud_routes)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_span::<axum::body::Body>))
            .layer(SetSensitiveRequestHeadersLayer::new(credential_headers(&config.auth.totp.header)))
            .layer(set_request_id_layer())
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        self.spawn_reloader(config_updates, shutdown.resubscribe());

        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        self.state.engine.shutdown().await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        self.spawn_reloader(config_updates, shutdown.resubscribe());

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            drain.graceful_shutdown(Some(TLS_DRAIN));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.clone().into_make_service())
            .await?;

        self.state.engine.shutdown().await;
        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    fn spawn_reloader(
        &self,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let current = self.config.clone();
        let gate = self.state.gate.clone();
        let authority = self.session_authority.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(new_config) = config_updates.recv() => {
                        apply_reload(&current, &new_config, &gate, authority.clone());
                    }
                    _ = shutdown.recv() => break,
                }
            }
        });
    }
}

/// Swap in an auth chain built from `new`. Other sections only take effect
/// on restart.
///
/// The TOTP header name stays at its startup value: the engine and trace
/// redaction are keyed on it.
pub fn apply_reload(
    current: &GatewayConfig,
    new: &GatewayConfig,
    gate: &ArcSwap<AuthChain>,
    authority: Arc<dyn SessionAuthority>,
) {
    if current.listener != new.listener
        || current.proxy != new.proxy
        || current.crud != new.crud
        || current.auth.session.url != new.auth.session.url
        || current.auth.session.timeout_secs != new.auth.session.timeout_secs
        || current.auth.totp.header != new.auth.totp.header
        || current.security != new.security
    {
        tracing::warn!("Reloaded config changes settings that need a restart; they are ignored until then");
    }

    let mut auth = new.auth.clone();
    auth.totp.header = current.auth.totp.header.clone();

    match AuthChain::from_config(&auth, authority, env_secret) {
        Ok(chain) => {
            tracing::info!(strategies = ?chain.strategy_names(), "Auth chain reloaded");
            gate.store(Arc::new(chain));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to rebuild auth chain. Keeping current configuration.");
        }
    }
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
