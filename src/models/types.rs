//! Type definitions shared by the shell, the UI server and the client glue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::errors::{AppError, AppResult};

// ============================================
// ASSET PROTOCOL
// ============================================

/// A request resolved to a file on disk. Produced fresh per request.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    /// Absolute or root-relative path that was read
    pub path: PathBuf,
    /// MIME type from the extension table ("" when unmapped)
    pub mime_type: &'static str,
    /// Raw file contents
    pub data: Vec<u8>,
}

/// What the webview receives for a custom-scheme request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl From<ResolvedAsset> for AssetResponse {
    fn from(asset: ResolvedAsset) -> Self {
        Self {
            mime_type: asset.mime_type,
            data: asset.data,
        }
    }
}

// ============================================
// COMPUTE VALUES
// ============================================

/// Primitive numeric value passed to or returned from a compute export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum WasmValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl WasmValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            WasmValue::I32(_) => "i32",
            WasmValue::I64(_) => "i64",
            WasmValue::F32(_) => "f32",
            WasmValue::F64(_) => "f64",
        }
    }

    /// Widen to f64 (used for display and float coercions)
    pub fn as_f64(&self) -> f64 {
        match *self {
            WasmValue::I32(v) => v as f64,
            WasmValue::I64(v) => v as f64,
            WasmValue::F32(v) => v as f64,
            WasmValue::F64(v) => v,
        }
    }
}

impl fmt::Display for WasmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WasmValue::I32(v) => write!(f, "{}", v),
            WasmValue::I64(v) => write!(f, "{}", v),
            WasmValue::F32(v) => write!(f, "{}", v),
            WasmValue::F64(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for WasmValue {
    type Err = AppError;

    /// Integers become i32 when they fit, i64 otherwise; anything with a
    /// decimal point or exponent becomes f64.
    fn from_str(s: &str) -> AppResult<Self> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i32>() {
            return Ok(WasmValue::I32(v));
        }
        if let Ok(v) = s.parse::<i64>() {
            return Ok(WasmValue::I64(v));
        }
        s.parse::<f64>()
            .map(WasmValue::F64)
            .map_err(|_| AppError::bad_request(format!("Not a numeric argument: {:?}", s)))
    }
}

// ============================================
// REACTIVE UI SCAFFOLD
// ============================================

/// Initial state of the UI's reactive data object.
///
/// Field names serialize exactly as the page binds them. There is no
/// behavior attached: the page owns every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    pub message: String,
    pub username: String,
    pub items: Vec<String>,
    #[serde(rename = "ValErrorTo")]
    pub val_error_to: String,
    #[serde(rename = "ValErrorFrom")]
    pub val_error_from: String,
    #[serde(rename = "hasClocktoError")]
    pub has_clockto_error: bool,
    #[serde(rename = "hasClockfromError")]
    pub has_clockfrom_error: bool,
    #[serde(rename = "hasComment")]
    pub has_comment: bool,
    #[serde(rename = "Clockfrom")]
    pub clock_from: String,
    #[serde(rename = "Clockto")]
    pub clock_to: String,
    #[serde(rename = "Comment")]
    pub comment: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            message: "Hello, ".to_string(),
            username: "Dude".to_string(),
            items: Vec::new(),
            val_error_to: "A".to_string(),
            val_error_from: "B".to_string(),
            has_clockto_error: false,
            has_clockfrom_error: false,
            has_comment: false,
            clock_from: String::new(),
            clock_to: String::new(),
            comment: String::new(),
        }
    }
}

// ============================================
// WEBSOCKET
// ============================================

/// Payload of an inbound WebSocket frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum MessagePayload {
    Text(String),
    Binary(Vec<u8>),
}

impl fmt::Display for MessagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessagePayload::Text(text) => write!(f, "{}", text),
            MessagePayload::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// One message received on a WebSocket connection
#[derive(Debug, Clone, Serialize)]
pub struct InboundMessage {
    /// Arrival order on this connection, starting at 0
    pub sequence: u64,
    pub payload: MessagePayload,
    pub received_at: DateTime<Utc>,
}
