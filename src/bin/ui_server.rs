//! Barracuda UI Server
//!
//! Serves the app root over HTTP and runs the WebSocket echo endpoint the
//! client glue talks to.
//!
//! Usage:
//!   cargo run --bin barracuda_ui_server
//!
//! Environment:
//!   BARRACUDA_APP_ROOT - Directory to serve (default: ui)
//!   BARRACUDA_UI_ADDR  - HTTP address (default: 127.0.0.1:8088)
//!   BARRACUDA_WS_ADDR  - WebSocket address (default: 127.0.0.1:3013)
//!   RUST_LOG           - Log level (default: info)

use barracuda_shell::api::{create_router, create_ws_router, AppState};
use barracuda_shell::{AssetResolver, ClickBindings, ShellConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = ShellConfig::from_env()?;
    let resolver = Arc::new(AssetResolver::new(&config.app_root, &config.scheme));

    let mut state = AppState::new(resolver.clone());
    match ClickBindings::load(&config, &resolver).await {
        Ok(Some(bindings)) => state = state.with_bindings(Arc::new(bindings)),
        Ok(None) => {}
        Err(e) => warn!("⚠️ Compute module unavailable, /v1/click disabled: {}", e),
    }
    let state = Arc::new(state);

    let http = TcpListener::bind(config.ui_addr).await?;
    let ws = TcpListener::bind(config.ws_addr).await?;

    info!("🚀 UI server on http://{}", config.ui_addr);
    info!("   serving {}", config.app_root.display());
    info!("🔌 Echo socket on ws://{}", config.ws_addr);
    info!("");
    info!("Endpoints:");
    info!("  GET  /v1/health             - Health check");
    info!("  GET  /v1/ui/state           - Initial UI state");
    info!("  POST /v1/click/:element_id  - Dispatch a click binding");
    info!("  GET  /*                     - Static assets");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal = |mut rx: watch::Receiver<bool>| async move {
        let _ = rx.wait_for(|stop| *stop).await;
    };

    let http_app = create_router(state.clone());
    let http_stop = signal(shutdown_rx.clone());
    let http_server = tokio::spawn(async move {
        axum::serve(http, http_app)
            .with_graceful_shutdown(http_stop)
            .await
    });

    let ws_app = create_ws_router(state.clone());
    let ws_stop = signal(shutdown_rx);
    let ws_server = tokio::spawn(async move {
        axum::serve(ws, ws_app).with_graceful_shutdown(ws_stop).await
    });

    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutdown signal received, cleaning up...");
    shutdown_tx.send_replace(true);

    http_server.await??;
    ws_server.await??;

    info!("👋 UI server shutdown complete ({} peers still connected)", state.peers.len());
    Ok(())
}
