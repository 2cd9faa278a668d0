//! Core Module - Shell Logic
//!
//! Asset protocol, lifecycle, bootstrap, window hosts and the compute-module host.

pub mod asset_protocol;
pub mod bindings;
pub mod bootstrap;
pub mod compute;
pub mod headless;
pub mod lifecycle;
#[cfg(feature = "webview")]
pub mod webview;

pub use asset_protocol::*;
pub use bindings::*;
pub use bootstrap::*;
pub use compute::*;
pub use headless::*;
pub use lifecycle::*;
