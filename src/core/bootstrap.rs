//! Desktop shell bootstrap
//!
//! One routine for every window configuration: the shell registers the asset
//! scheme, opens a window sized from a [`WindowSpec`], and follows the
//! lifecycle until quit. The windowing toolkit sits behind [`WindowHost`].

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::asset_protocol::AssetResolver;
use super::lifecycle::{Lifecycle, LifecycleAction, LifecycleEvent, LifecycleState};
use crate::models::config::{ShellConfig, WindowSpec};
use crate::models::errors::{AppError, AppResult};

/// Host-assigned window identifier
pub type HostWindowId = u64;

/// The seam between the shell and a windowing toolkit
pub trait WindowHost {
    /// Make `scheme` requests answerable by `resolver` in every window
    /// opened afterwards
    fn register_scheme(&mut self, scheme: &str, resolver: Arc<AssetResolver>) -> AppResult<()>;

    /// Open a window loading `url`
    fn open_window(&mut self, spec: &WindowSpec, url: &str) -> AppResult<HostWindowId>;

    /// Leave the event loop
    fn quit(&mut self);
}

/// Owns the lifecycle and the set of open windows
pub struct Shell {
    lifecycle: Lifecycle,
    resolver: Arc<AssetResolver>,
    window: WindowSpec,
    windows: HashSet<HostWindowId>,
    started: bool,
}

impl Shell {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            lifecycle: Lifecycle::new(config.quit_on_last_window),
            resolver: Arc::new(AssetResolver::new(&config.app_root, &config.scheme)),
            window: config.window.clone(),
            windows: HashSet::new(),
            started: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn resolver(&self) -> Arc<AssetResolver> {
        self.resolver.clone()
    }

    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }

    /// Run the bootstrap. Allowed once per shell.
    pub fn start<H: WindowHost>(&mut self, host: &mut H) -> AppResult<LifecycleState> {
        if self.started {
            return Err(AppError::invalid_transition("Shell already started"));
        }
        self.started = true;
        info!(
            "🚀 Bootstrapping shell ({}x{}, entry {})",
            self.window.width, self.window.height, self.window.entry
        );
        self.dispatch(LifecycleEvent::Ready, host)
    }

    /// Feed a host event through the lifecycle and perform resulting actions
    pub fn dispatch<H: WindowHost>(
        &mut self,
        event: LifecycleEvent,
        host: &mut H,
    ) -> AppResult<LifecycleState> {
        let transition = self.lifecycle.apply(event)?;
        if transition.from != transition.to {
            info!("🔄 Lifecycle {} -> {}", transition.from, transition.to);
        }

        for action in transition.actions {
            match action {
                LifecycleAction::RegisterScheme => {
                    let scheme = self.resolver.scheme().to_string();
                    if let Err(e) = host.register_scheme(&scheme, self.resolver.clone()) {
                        // The window still opens; its loads will fail visibly.
                        error!("❌ Failed to register {} protocol: {}", scheme, e);
                    }
                }
                LifecycleAction::CreateWindow => {
                    let url = self.window.url(self.resolver.scheme());
                    let id = host.open_window(&self.window, &url)?;
                    self.windows.insert(id);
                    info!("🪟 Window {} opened at {}", id, url);
                }
                LifecycleAction::Quit => {
                    info!("🛑 Quitting");
                    host.quit();
                }
            }
        }

        Ok(self.lifecycle.state())
    }

    /// Record a closed window and let the lifecycle decide whether to quit
    pub fn window_closed<H: WindowHost>(
        &mut self,
        id: HostWindowId,
        host: &mut H,
    ) -> AppResult<LifecycleState> {
        if !self.windows.remove(&id) {
            warn!("Close for unknown window {}", id);
        }
        let remaining = self.windows.len();
        self.dispatch(LifecycleEvent::WindowClosed { remaining }, host)
    }

    /// Dock/taskbar activation
    pub fn activate<H: WindowHost>(&mut self, host: &mut H) -> AppResult<LifecycleState> {
        let open_windows = self.windows.len();
        self.dispatch(LifecycleEvent::Activate { open_windows }, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<String>,
        next_id: HostWindowId,
        fail_registration: bool,
    }

    impl WindowHost for RecordingHost {
        fn register_scheme(&mut self, scheme: &str, _resolver: Arc<AssetResolver>) -> AppResult<()> {
            self.calls.push(format!("register:{}", scheme));
            if self.fail_registration {
                return Err(AppError::new(
                    ErrorCode::ShellProtocolRegistrationFailed,
                    "scheme taken",
                ));
            }
            Ok(())
        }

        fn open_window(&mut self, spec: &WindowSpec, url: &str) -> AppResult<HostWindowId> {
            self.calls
                .push(format!("open:{}x{}:{}", spec.width, spec.height, url));
            self.next_id += 1;
            Ok(self.next_id)
        }

        fn quit(&mut self) {
            self.calls.push("quit".to_string());
        }
    }

    fn config(quit_on_last_window: bool) -> ShellConfig {
        ShellConfig {
            quit_on_last_window,
            ..ShellConfig::default()
        }
    }

    #[test]
    fn test_start_registers_then_opens() {
        let mut shell = Shell::new(&config(true));
        let mut host = RecordingHost::default();

        let state = shell.start(&mut host).unwrap();

        assert_eq!(state, LifecycleState::Running);
        assert_eq!(host.calls.len(), 2);
        assert_eq!(host.calls[0], "register:app");
        assert!(host.calls[1].starts_with("open:800x600:"));
        assert!(host.calls[1].ends_with("/index.html"));
        assert_eq!(shell.open_windows(), 1);
    }

    #[test]
    fn test_inspector_window_size() {
        let cfg = ShellConfig {
            window: WindowSpec::inspector(),
            ..config(true)
        };
        let mut shell = Shell::new(&cfg);
        let mut host = RecordingHost::default();
        shell.start(&mut host).unwrap();
        assert!(host.calls[1].starts_with("open:1000x800:"));
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut shell = Shell::new(&config(true));
        let mut host = RecordingHost::default();
        shell.start(&mut host).unwrap();
        let err = shell.start(&mut host).unwrap_err();
        assert_eq!(err.code, ErrorCode::LifecycleInvalidTransition);
        assert_eq!(host.calls.len(), 2);
    }

    #[test]
    fn test_registration_failure_still_opens_window() {
        let mut shell = Shell::new(&config(true));
        let mut host = RecordingHost {
            fail_registration: true,
            ..Default::default()
        };
        let state = shell.start(&mut host).unwrap();
        assert_eq!(state, LifecycleState::Running);
        assert_eq!(shell.open_windows(), 1);
    }

    #[test]
    fn test_closing_last_window_quits() {
        let mut shell = Shell::new(&config(true));
        let mut host = RecordingHost::default();
        shell.start(&mut host).unwrap();

        let state = shell.window_closed(1, &mut host).unwrap();

        assert_eq!(state, LifecycleState::Closing);
        assert_eq!(host.calls.last().map(String::as_str), Some("quit"));
    }

    #[test]
    fn test_activate_recreates_window_when_kept_alive() {
        let mut shell = Shell::new(&config(false));
        let mut host = RecordingHost::default();
        shell.start(&mut host).unwrap();
        shell.window_closed(1, &mut host).unwrap();
        assert_eq!(shell.open_windows(), 0);

        shell.activate(&mut host).unwrap();

        assert_eq!(shell.open_windows(), 1);
        assert!(!host.calls.contains(&"quit".to_string()));
    }
}
