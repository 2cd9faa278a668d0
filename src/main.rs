//! Barracuda desktop shell
//!
//! Boots the shell: registers the app scheme, opens the main window and
//! follows the window lifecycle until quit. Built with `--features webview`
//! the window is native; otherwise the app root is served over HTTP and the
//! window address is logged.
//!
//! Environment: see `ShellConfig::from_env` (`BARRACUDA_*`), `RUST_LOG`.

use barracuda_shell::{AssetResolver, ClickBindings, ShellConfig};
use eyre::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let config = ShellConfig::from_env()?;
    info!(
        "🐟 {} v{} starting (root: {}, scheme: {})",
        barracuda_shell::utils::APP_NAME,
        barracuda_shell::utils::APP_VERSION,
        config.app_root.display(),
        config.scheme
    );

    // The native event loop needs the main thread, so the runtime is built
    // by hand rather than through #[tokio::main].
    let runtime = tokio::runtime::Runtime::new()?;

    let resolver = AssetResolver::new(&config.app_root, &config.scheme);
    let bindings = match runtime.block_on(ClickBindings::load(&config, &resolver)) {
        Ok(bindings) => bindings.map(Arc::new),
        Err(e) => {
            warn!("⚠️ Compute module unavailable, clicks stay unbound: {}", e);
            None
        }
    };

    #[cfg(feature = "webview")]
    {
        let _guard = runtime.enter();
        barracuda_shell::core::webview::run(&config, bindings)?;
    }

    #[cfg(not(feature = "webview"))]
    runtime.block_on(headless::run(config, bindings))?;

    info!("👋 Shell exited");
    Ok(())
}

#[cfg(not(feature = "webview"))]
mod headless {
    use barracuda_shell::api::{create_router, AppState};
    use barracuda_shell::{ClickBindings, HeadlessHost, LifecycleEvent, Shell, ShellConfig};
    use eyre::Result;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tracing::info;

    pub async fn run(config: ShellConfig, bindings: Option<Arc<ClickBindings>>) -> Result<()> {
        let mut shell = Shell::new(&config);
        let mut host = HeadlessHost::new(&config.ui_addr.to_string());

        shell.start(&mut host)?;

        // Assets are served only if the scheme registration went through.
        let mut state = AppState::for_host(&host);
        if let Some(bindings) = bindings {
            state = state.with_bindings(bindings);
        }
        let app = create_router(Arc::new(state));

        let listener = TcpListener::bind(config.ui_addr).await?;
        let shutdown = host.shutdown_signal();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
        });
        info!("Press Ctrl+C to quit");

        tokio::signal::ctrl_c().await?;
        info!("🛑 Shutdown signal received");
        shell.dispatch(LifecycleEvent::QuitRequested, &mut host)?;

        server.await??;
        Ok(())
    }
}
