//! Barracuda client glue
//!
//! Loads the compute module, runs its startup calls and the default click
//! binding, then opens the greeting socket and logs every message until the
//! server closes or Ctrl+C.
//!
//! Environment:
//!   BARRACUDA_COMPUTE_MODULE - Module path under the app root or http(s) URL
//!   BARRACUDA_STARTUP_CALLS  - e.g. "hello_world:1011"
//!   BARRACUDA_WS_URL         - WebSocket endpoint (default: ws://127.0.0.1:3013)
//!   BARRACUDA_GREETING       - Greeting sent once on open

use barracuda_shell::{AssetResolver, ClickBindings, ShellConfig, WsClient, WsEvent};
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
    let resolver = AssetResolver::new(&config.app_root, &config.scheme);

    match ClickBindings::load(&config, &resolver).await {
        Ok(Some(bindings)) => {
            // Same effect as the page's first click on each bound element.
            for element_id in bindings.element_ids() {
                if let Err(e) = bindings.dispatch(element_id) {
                    warn!("⚠️ {} failed: {}", element_id, e);
                }
            }
        }
        Ok(None) => info!("No compute module configured"),
        Err(e) => warn!("⚠️ Compute module unavailable: {}", e),
    }

    let client = WsClient::from_config(&config);
    let mut connection = client.connect().await?;

    loop {
        tokio::select! {
            event = connection.next_event() => match event {
                Some(WsEvent::Connected) | Some(WsEvent::Message(_)) => {}
                Some(WsEvent::Error(e)) => warn!("⚠️ Socket error: {}", e),
                Some(WsEvent::Disconnected) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Closing socket");
                break;
            }
        }
    }

    connection.close().await?;
    Ok(())
}
