//! Barracuda Desktop Shell Library
//!
//! Hosts a web UI in a desktop shell:
//! - `app://` custom scheme answered from a local app root
//! - window lifecycle with per-platform quit policy
//! - WebAssembly compute modules bound to UI clicks
//! - greeting WebSocket client and the UI/echo server it talks to

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    AssetResolver, ClickBindings, ComputeInstance, ComputeModule, HeadlessHost, Lifecycle,
    LifecycleEvent, LifecycleState, ModuleSource, Shell, WindowHost,
};
pub use models::{AppError, AppResult, ErrorCode, ShellConfig, WindowSpec};
pub use providers::{WsClient, WsConnection, WsEvent};
