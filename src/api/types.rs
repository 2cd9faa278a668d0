//! API Request/Response Types

use serde::Serialize;

use crate::core::bindings::ClickOutcome;
use crate::models::errors::AppError;
use crate::models::types::WasmValue;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

// ============================================
// Health
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub ws_peers: usize,
    /// Element ids with a compute binding; empty without a module
    pub bindings: Vec<String>,
}

// ============================================
// Click dispatch
// ============================================

#[derive(Debug, Serialize)]
pub struct ClickData {
    pub element_id: String,
    pub export: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WasmValue>,
}

impl From<ClickOutcome> for ClickData {
    fn from(outcome: ClickOutcome) -> Self {
        Self {
            element_id: outcome.element_id,
            export: outcome.export,
            result: outcome.result,
        }
    }
}
