//! Native window host (winit + wry)
//!
//! Each window carries one webview. The app scheme is registered as a wry
//! custom protocol answered by [`AssetResolver::respond`]; clicks on elements
//! with an id are posted back over IPC as `click:<id>` and dispatched to the
//! click bindings.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};
use wry::http::{header::CONTENT_TYPE, Request, Response};
use wry::{WebView, WebViewBuilder};

use super::asset_protocol::AssetResolver;
use super::bindings::ClickBindings;
use super::bootstrap::{HostWindowId, Shell, WindowHost};
use crate::models::config::{ShellConfig, WindowSpec};
use crate::models::errors::{AppError, AppResult, ErrorCode};

const CLICK_BRIDGE: &str = r#"
document.addEventListener('click', (event) => {
  const id = event.target && event.target.id;
  if (id) { window.ipc.postMessage('click:' + id); }
});
"#;

struct OpenView {
    id: HostWindowId,
    // Dropped before the window it renders into.
    _webview: WebView,
    _window: Window,
}

/// Borrowed view of the app for the duration of one event
struct WebviewHost<'a> {
    event_loop: &'a ActiveEventLoop,
    views: &'a mut HashMap<WindowId, OpenView>,
    protocol: &'a mut Option<(String, Arc<AssetResolver>)>,
    bindings: Option<Arc<ClickBindings>>,
    next_id: &'a mut HostWindowId,
}

impl WindowHost for WebviewHost<'_> {
    fn register_scheme(&mut self, scheme: &str, resolver: Arc<AssetResolver>) -> AppResult<()> {
        if self.protocol.is_some() {
            return Err(AppError::new(
                ErrorCode::ShellProtocolRegistrationFailed,
                format!("{} protocol registered twice", scheme),
            ));
        }
        *self.protocol = Some((scheme.to_string(), resolver));
        Ok(())
    }

    fn open_window(&mut self, spec: &WindowSpec, url: &str) -> AppResult<HostWindowId> {
        let attributes = Window::default_attributes()
            .with_title(spec.title.as_str())
            .with_inner_size(LogicalSize::new(spec.width, spec.height));
        let window = self.event_loop.create_window(attributes).map_err(|e| {
            AppError::with_source(ErrorCode::ShellWindowFailed, "Cannot create window", e)
        })?;

        let mut builder = WebViewBuilder::new()
            .with_url(url)
            .with_devtools(spec.devtools)
            .with_initialization_script(CLICK_BRIDGE);

        if let Some((scheme, resolver)) = self.protocol.clone() {
            builder = builder.with_custom_protocol(scheme, move |_id, request: Request<Vec<u8>>| {
                let asset = resolver.respond(&request.uri().to_string());
                Response::builder()
                    .header(CONTENT_TYPE, asset.mime_type)
                    .body(Cow::Owned(asset.data))
                    .unwrap_or_else(|_| Response::new(Cow::Borrowed(&[][..])))
            });
        }

        if let Some(bindings) = self.bindings.clone() {
            builder = builder.with_ipc_handler(move |request: Request<String>| {
                let Some(element_id) = request.body().strip_prefix("click:") else {
                    debug!("Ignoring IPC message {}", request.body());
                    return;
                };
                match bindings.dispatch(element_id) {
                    Ok(Some(outcome)) => debug!("Click {} handled", outcome.element_id),
                    Ok(None) => {}
                    Err(e) => error!("❌ Click on {} failed: {}", element_id, e),
                }
            });
        }

        let webview = builder.build(&window).map_err(|e| {
            AppError::with_source(ErrorCode::ShellWindowFailed, "Cannot create webview", e)
        })?;

        *self.next_id += 1;
        let id = *self.next_id;
        self.views.insert(
            window.id(),
            OpenView {
                id,
                _webview: webview,
                _window: window,
            },
        );
        Ok(id)
    }

    fn quit(&mut self) {
        self.event_loop.exit();
    }
}

struct ShellApp {
    shell: Shell,
    views: HashMap<WindowId, OpenView>,
    protocol: Option<(String, Arc<AssetResolver>)>,
    bindings: Option<Arc<ClickBindings>>,
    next_id: HostWindowId,
    started: bool,
    failure: Option<AppError>,
}

impl ShellApp {
    fn host<'a>(
        event_loop: &'a ActiveEventLoop,
        views: &'a mut HashMap<WindowId, OpenView>,
        protocol: &'a mut Option<(String, Arc<AssetResolver>)>,
        bindings: &Option<Arc<ClickBindings>>,
        next_id: &'a mut HostWindowId,
    ) -> WebviewHost<'a> {
        WebviewHost {
            event_loop,
            views,
            protocol,
            bindings: bindings.clone(),
            next_id,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!(code = err.code_str(), "❌ Shell failed: {}", err);
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for ShellApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let mut host = Self::host(
            event_loop,
            &mut self.views,
            &mut self.protocol,
            &self.bindings,
            &mut self.next_id,
        );
        let result = if self.started {
            self.shell.activate(&mut host)
        } else {
            self.started = true;
            self.shell.start(&mut host)
        };
        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if !matches!(event, WindowEvent::CloseRequested) {
            return;
        }
        let Some(view) = self.views.remove(&window_id) else {
            warn!("⚠️ Close for untracked window {:?}", window_id);
            return;
        };
        let closed = view.id;
        drop(view);

        let mut host = Self::host(
            event_loop,
            &mut self.views,
            &mut self.protocol,
            &self.bindings,
            &mut self.next_id,
        );
        if let Err(e) = self.shell.window_closed(closed, &mut host) {
            self.fail(event_loop, e);
        }
    }
}

/// Run the shell in native windows until the lifecycle quits
pub fn run(config: &ShellConfig, bindings: Option<Arc<ClickBindings>>) -> eyre::Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ShellApp {
        shell: Shell::new(config),
        views: HashMap::new(),
        protocol: None,
        bindings,
        next_id: 0,
        started: false,
        failure: None,
    };

    info!("🖥️ Starting native event loop");
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(err) => Err(eyre::eyre!(err.to_string())),
        None => Ok(()),
    }
}
