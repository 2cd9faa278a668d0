//! Configuration module for the Barracuda shell
//!
//! Uses constants from utils/constants.rs. Every field can be overridden from
//! the environment; `ShellConfig::from_env` reports bad values instead of
//! silently falling back.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use super::errors::{AppError, AppResult};
use super::types::WasmValue;
use crate::utils::constants::{
    entry_url, APP_NAME, DEFAULT_APP_ROOT, DEFAULT_BINDINGS, DEFAULT_COMPUTE_MODULE,
    DEFAULT_ENTRY, DEFAULT_GREETING, DEFAULT_SCHEME, DEFAULT_UI_ADDR, DEFAULT_WS_ADDR,
    DEFAULT_WS_URL, INSPECTOR_WINDOW, STANDARD_WINDOW,
};

// ============================================
// WINDOW
// ============================================

/// Parameters of the single window the bootstrap opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Entry file relative to the app root
    pub entry: String,
    pub devtools: bool,
}

impl WindowSpec {
    /// 800x600, no devtools
    pub fn standard() -> Self {
        Self {
            title: APP_NAME.to_string(),
            width: STANDARD_WINDOW.0,
            height: STANDARD_WINDOW.1,
            entry: DEFAULT_ENTRY.to_string(),
            devtools: false,
        }
    }

    /// 1000x800 with devtools open
    pub fn inspector() -> Self {
        Self {
            width: INSPECTOR_WINDOW.0,
            height: INSPECTOR_WINDOW.1,
            devtools: true,
            ..Self::standard()
        }
    }

    /// URL the window loads through the custom scheme
    pub fn url(&self, scheme: &str) -> String {
        entry_url(scheme, &self.entry)
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================
// COMPUTE CALLS
// ============================================

/// A named export plus its arguments, written `name:arg1,arg2`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportCall {
    pub export: String,
    pub args: Vec<WasmValue>,
}

impl ExportCall {
    pub fn new(export: impl Into<String>, args: Vec<WasmValue>) -> Self {
        Self {
            export: export.into(),
            args,
        }
    }

    /// Parse `square:3`, `hello_world:1011` or a bare `tada`
    pub fn parse(spec: &str) -> AppResult<Self> {
        let spec = spec.trim();
        let (name, args) = match spec.split_once(':') {
            Some((name, args)) => (name.trim(), args.trim()),
            None => (spec, ""),
        };

        if name.is_empty() {
            return Err(AppError::bad_request(format!("Missing export name in {:?}", spec)));
        }

        let args = if args.is_empty() {
            Vec::new()
        } else {
            args.split(',')
                .map(|a| a.parse::<WasmValue>())
                .collect::<AppResult<Vec<_>>>()?
        };

        Ok(Self::new(name, args))
    }

    /// Parse a `;`-separated list of calls
    pub fn parse_list(spec: &str) -> AppResult<Vec<Self>> {
        spec.split(';')
            .filter(|s| !s.trim().is_empty())
            .map(Self::parse)
            .collect()
    }
}

/// UI element id bound to one export call
#[derive(Debug, Clone, PartialEq)]
pub struct ClickBinding {
    pub element_id: String,
    pub call: ExportCall,
}

impl ClickBinding {
    /// Parse `ok_button=square:3,but=tada`.
    ///
    /// A comma starts a new binding only when the next segment contains `=`;
    /// otherwise it separates arguments of the current call.
    pub fn parse_list(spec: &str) -> AppResult<Vec<Self>> {
        let mut raw: Vec<String> = Vec::new();
        for segment in spec.split(',') {
            if segment.contains('=') || raw.is_empty() {
                raw.push(segment.to_string());
            } else if let Some(current) = raw.last_mut() {
                current.push(',');
                current.push_str(segment);
            }
        }

        raw.iter()
            .filter(|s| !s.trim().is_empty())
            .map(|entry| {
                let (element_id, call) = entry
                    .split_once('=')
                    .ok_or_else(|| AppError::invalid_config("BARRACUDA_BINDINGS", entry))?;
                let element_id = element_id.trim();
                if element_id.is_empty() {
                    return Err(AppError::invalid_config("BARRACUDA_BINDINGS", entry));
                }
                Ok(ClickBinding {
                    element_id: element_id.to_string(),
                    call: ExportCall::parse(call)?,
                })
            })
            .collect()
    }
}

// ============================================
// SHELL CONFIG
// ============================================

/// Configuration for the shell, the UI server and the client glue
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Directory the asset resolver serves from
    pub app_root: PathBuf,
    /// Custom URL scheme
    pub scheme: String,
    /// The one window the bootstrap opens
    pub window: WindowSpec,
    /// HTTP asset server bind address
    pub ui_addr: SocketAddr,
    /// WebSocket echo server bind address
    pub ws_addr: SocketAddr,
    /// WebSocket endpoint for the client
    pub ws_url: String,
    /// Greeting sent once on open
    pub greeting: String,
    /// Compute module path (relative to app root) or http(s) URL
    pub compute_module: Option<String>,
    /// Exports invoked once after instantiation
    pub startup_calls: Vec<ExportCall>,
    /// Element id -> export bindings
    pub bindings: Vec<ClickBinding>,
    /// Quit when the last window closes
    pub quit_on_last_window: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from(DEFAULT_APP_ROOT),
            scheme: DEFAULT_SCHEME.to_string(),
            window: WindowSpec::standard(),
            ui_addr: SocketAddr::from(([127, 0, 0, 1], 8088)),
            ws_addr: SocketAddr::from(([127, 0, 0, 1], 3013)),
            ws_url: DEFAULT_WS_URL.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            compute_module: Some(DEFAULT_COMPUTE_MODULE.to_string()),
            startup_calls: Vec::new(),
            bindings: ClickBinding::parse_list(DEFAULT_BINDINGS).unwrap_or_default(),
            // macOS apps stay alive with no windows until Cmd+Q
            quit_on_last_window: !cfg!(target_os = "macos"),
        }
    }
}

impl ShellConfig {
    /// Build from `BARRACUDA_*` environment variables over the defaults
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test maps)
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup("BARRACUDA_APP_ROOT") {
            config.app_root = PathBuf::from(root);
        }
        if let Some(scheme) = lookup("BARRACUDA_SCHEME") {
            if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(AppError::invalid_config("BARRACUDA_SCHEME", &scheme));
            }
            config.scheme = scheme.to_ascii_lowercase();
        }

        // Devtools selects the inspector preset; explicit sizes win over it.
        if let Some(devtools) = lookup("BARRACUDA_DEVTOOLS") {
            if parse_value::<bool>("BARRACUDA_DEVTOOLS", &devtools)? {
                config.window = WindowSpec::inspector();
            }
        }
        if let Some(width) = lookup("BARRACUDA_WINDOW_WIDTH") {
            config.window.width = parse_value("BARRACUDA_WINDOW_WIDTH", &width)?;
        }
        if let Some(height) = lookup("BARRACUDA_WINDOW_HEIGHT") {
            config.window.height = parse_value("BARRACUDA_WINDOW_HEIGHT", &height)?;
        }
        if config.window.width == 0 || config.window.height == 0 {
            return Err(AppError::invalid_config(
                "BARRACUDA_WINDOW_WIDTH/HEIGHT",
                &format!("{}x{}", config.window.width, config.window.height),
            ));
        }
        if let Some(entry) = lookup("BARRACUDA_ENTRY") {
            config.window.entry = entry;
        }

        config.ui_addr = parse_value(
            "BARRACUDA_UI_ADDR",
            &lookup("BARRACUDA_UI_ADDR").unwrap_or_else(|| DEFAULT_UI_ADDR.to_string()),
        )?;
        config.ws_addr = parse_value(
            "BARRACUDA_WS_ADDR",
            &lookup("BARRACUDA_WS_ADDR").unwrap_or_else(|| DEFAULT_WS_ADDR.to_string()),
        )?;

        if let Some(url) = lookup("BARRACUDA_WS_URL") {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(AppError::invalid_config("BARRACUDA_WS_URL", &url));
            }
            config.ws_url = url;
        }
        if let Some(greeting) = lookup("BARRACUDA_GREETING") {
            config.greeting = greeting;
        }
        if let Some(module) = lookup("BARRACUDA_COMPUTE_MODULE") {
            config.compute_module = if module.is_empty() { None } else { Some(module) };
        }
        if let Some(calls) = lookup("BARRACUDA_STARTUP_CALLS") {
            config.startup_calls = ExportCall::parse_list(&calls)?;
        }
        if let Some(bindings) = lookup("BARRACUDA_BINDINGS") {
            config.bindings = ClickBinding::parse_list(&bindings)?;
        }
        if let Some(quit) = lookup("BARRACUDA_QUIT_ON_LAST_WINDOW") {
            config.quit_on_last_window = parse_value("BARRACUDA_QUIT_ON_LAST_WINDOW", &quit)?;
        }

        debug!(?config, "Shell configuration loaded");
        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::invalid_config(key, raw))
}
