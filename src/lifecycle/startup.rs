//! Startup orchestration.
//!
//! Order: metrics, collaborators and auth chain, listener, config watcher,
//! then serve. Any startup error is fatal.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::watcher::ConfigWatcher;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::HttpServer;
use crate::lifecycle::signals::{reload_on_hangup, shutdown_signal};
use crate::lifecycle::Shutdown;
use crate::net::load_tls_config;
use crate::observability::metrics;

/// Run the gateway until a shutdown signal arrives.
///
/// `config_path` enables hot reload of the `[auth]` section.
pub async fn run(config: GatewayConfig, config_path: Option<PathBuf>) -> Result<(), GatewayError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| GatewayError::Address(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let listener_config = config.listener.clone();
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    // Keeps the sender alive when there is no file to watch.
    let (_idle_tx, idle_rx) = mpsc::unbounded_channel();
    let (config_updates, _watcher) = match config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(&path);
            tokio::spawn(reload_on_hangup(path, watcher.sender(), shutdown.subscribe()));
            (rx, Some(watcher.run()?))
        }
        None => (idle_rx, None),
    };

    shutdown.trigger_on(shutdown_signal());

    match &listener_config.tls {
        Some(tls) => {
            let addr: SocketAddr = listener_config
                .bind_address
                .parse()
                .map_err(|_| GatewayError::Address(listener_config.bind_address.clone()))?;
            let tls_config = load_tls_config(tls).await?;
            server.run_tls(addr, tls_config, config_updates, server_shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&listener_config.bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, config_updates, server_shutdown).await?;
        }
    }

    Ok(())
}
