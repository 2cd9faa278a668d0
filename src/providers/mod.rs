//! Providers Module - Outbound Connections
//!
//! The greeting WebSocket client used by the compute/client glue.

pub mod websocket;

pub use websocket::*;
