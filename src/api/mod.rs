//! UI Server API Module
//!
//! Serves the app root over HTTP, exposes the UI state and click endpoints,
//! and runs the WebSocket echo endpoint.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::{create_router, create_ws_router};
pub use types::*;
