use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indradhanu_server::{build_router, env_lookup, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "indradhanu_server", version, about = "Indradhanu smart-city backend")]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Listen address, overriding `[server] bind`.
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// JSON-lines simulation log, overriding `[telemetry] log_path`.
    #[arg(long)]
    log_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind.to_string();
    }
    if let Some(path) = cli.log_path {
        config.telemetry.log_path = Some(path);
    }
    let addr = config.bind_addr()?;

    let state = AppState::from_config(&config, env_lookup).context("failed to bootstrap server")?;
    let app = build_router(state, &config.server.allow_origins);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "indradhanu backend listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server error")
}
