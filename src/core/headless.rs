//! Headless window host
//!
//! The default build has no native window. The registered scheme is served by
//! the HTTP asset server instead, and "opening" a window logs the address to
//! point a browser at. Quit is broadcast on a watch channel so the server can
//! shut down gracefully.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::asset_protocol::AssetResolver;
use super::bootstrap::{HostWindowId, WindowHost};
use crate::models::config::WindowSpec;
use crate::models::errors::{AppError, AppResult, ErrorCode};

pub struct HeadlessHost {
    base_url: String,
    resolver: Option<Arc<AssetResolver>>,
    windows: Vec<(HostWindowId, String)>,
    next_id: HostWindowId,
    shutdown: watch::Sender<bool>,
}

impl HeadlessHost {
    /// `ui_addr` is the asset server's listen address, e.g. `127.0.0.1:8088`
    pub fn new(ui_addr: &str) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            base_url: format!("http://{}", ui_addr),
            resolver: None,
            windows: Vec::new(),
            next_id: 0,
            shutdown,
        }
    }

    pub fn resolver(&self) -> Option<Arc<AssetResolver>> {
        self.resolver.clone()
    }

    /// URLs of every window opened so far
    pub fn window_urls(&self) -> Vec<&str> {
        self.windows.iter().map(|(_, url)| url.as_str()).collect()
    }

    /// Resolves once `quit` has been called
    pub fn shutdown_signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            // An error means the host is gone, which is a shutdown as well.
            let _ = rx.wait_for(|quit| *quit).await;
        }
    }

    pub fn is_quit(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl WindowHost for HeadlessHost {
    fn register_scheme(&mut self, scheme: &str, resolver: Arc<AssetResolver>) -> AppResult<()> {
        if let Some(existing) = &self.resolver {
            return Err(AppError::new(
                ErrorCode::ShellProtocolRegistrationFailed,
                format!("Scheme {} already served from {}", existing.scheme(), existing.root().display()),
            ));
        }
        if !resolver.root().is_dir() {
            return Err(AppError::new(
                ErrorCode::ShellProtocolRegistrationFailed,
                format!("App root {} is not a directory", resolver.root().display()),
            ));
        }
        info!(
            "📦 Serving {}:// from {} at {}",
            scheme,
            resolver.root().display(),
            self.base_url
        );
        self.resolver = Some(resolver);
        Ok(())
    }

    fn open_window(&mut self, spec: &WindowSpec, url: &str) -> AppResult<HostWindowId> {
        if self.is_quit() {
            return Err(AppError::new(ErrorCode::ShellWindowFailed, "Host already quit"));
        }
        if self.resolver.is_none() {
            warn!("⚠️ Opening {} before any scheme was registered", url);
        }

        self.next_id += 1;
        let http_url = format!("{}/{}", self.base_url, spec.entry.trim_start_matches('/'));
        info!(
            "🪟 \"{}\" ({}x{}{}) -> open {}",
            spec.title,
            spec.width,
            spec.height,
            if spec.devtools { ", devtools" } else { "" },
            http_url
        );
        self.windows.push((self.next_id, http_url));
        Ok(self.next_id)
    }

    fn quit(&mut self) {
        self.shutdown.send_replace(true);
    }
}
