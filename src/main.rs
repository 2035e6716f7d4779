//! API Gateway
//!
//! Two handlers behind one listener.
//!
//! ```text
//!                          ┌───────────────────────────────────────────────┐
//!                          │                  API GATEWAY                  │
//!   Client Request         │                                               │
//!   ───────────────────────┼─▶ request id ─▶ trace ─▶ body limit ─┐        │
//!                          │                                      │        │
//!                          │        ┌─────────────────────────────┴──┐     │
//!                          │        ▼                                ▼     │
//!                          │  /api/openai/*                   /api/rest/*  │
//!                          │  ┌──────────┐              ┌───────────────┐  │
//!                          │  │  proxy   │              │  auth chain   │  │
//!                          │  │ rewrite  │              │ totp→session  │  │
//!                          │  └────┬─────┘              └──────┬────────┘  │
//!                          │       │ Authorization only        │ 401 / ok  │
//!                          │       ▼                           ▼           │
//!                          │  completion API             CRUD engine       │
//!                          └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use api_gateway::config::{load_config, GatewayConfig};
use api_gateway::lifecycle::startup;
use api_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Completion API proxy and gated CRUD gateway", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        proxy_mount = %config.proxy.mount_path,
        upstream = %config.proxy.upstream_url,
        crud_mount = %config.crud.mount_path,
        engine = %config.crud.engine_url,
        totp = config.auth.totp.enabled,
        session = config.auth.session.enabled,
        "Configuration loaded"
    );

    startup::run(config, cli.config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
