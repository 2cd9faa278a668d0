//! Centralized Error Handling Module
//!
//! Every failure in the shell carries a unique error code so log lines can be
//! grepped and mapped to an HTTP status by the UI server.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - ASSET_xxx: asset-protocol resolution errors
//! - SHELL_xxx / LIFECYCLE_xxx: bootstrap and window host errors
//! - COMPUTE_xxx: compute module errors
//! - WS_xxx: WebSocket errors
//! - CFG_xxx: Configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Asset Protocol Errors
    // ============================================
    /// Request URL could not be parsed or decoded
    AssetInvalidUrl,
    /// Path escapes the app root
    AssetPathRejected,
    /// File does not exist
    AssetNotFound,
    /// File exists but could not be read
    AssetReadFailed,

    // ============================================
    // Shell / Lifecycle Errors
    // ============================================
    /// Custom scheme registration failed
    ShellProtocolRegistrationFailed,
    /// Window creation failed
    ShellWindowFailed,
    /// Trigger not accepted in the current lifecycle state
    LifecycleInvalidTransition,

    // ============================================
    // Compute Module Errors
    // ============================================
    /// Module bytes could not be fetched
    ComputeFetchFailed,
    /// Module failed to compile
    ComputeCompileFailed,
    /// Module failed to instantiate (missing imports, start trap)
    ComputeInstantiateFailed,
    /// Named export does not exist or is not a function
    ComputeExportNotFound,
    /// Arguments do not fit the export signature
    ComputeArgumentMismatch,
    /// Export trapped
    ComputeCallFailed,

    // ============================================
    // WebSocket Errors
    // ============================================
    /// Connection could not be established
    WsConnectionFailed,
    /// Outbound frame could not be written
    WsSendFailed,
    /// Connection already closed
    WsClosed,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Resource not found
    ApiNotFound,
    /// Feature not available in this server
    ApiUnavailable,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssetInvalidUrl => "ASSET_INVALID_URL",
            Self::AssetPathRejected => "ASSET_PATH_REJECTED",
            Self::AssetNotFound => "ASSET_NOT_FOUND",
            Self::AssetReadFailed => "ASSET_READ_FAILED",

            Self::ShellProtocolRegistrationFailed => "SHELL_PROTOCOL_REGISTRATION_FAILED",
            Self::ShellWindowFailed => "SHELL_WINDOW_FAILED",
            Self::LifecycleInvalidTransition => "LIFECYCLE_INVALID_TRANSITION",

            Self::ComputeFetchFailed => "COMPUTE_FETCH_FAILED",
            Self::ComputeCompileFailed => "COMPUTE_COMPILE_FAILED",
            Self::ComputeInstantiateFailed => "COMPUTE_INSTANTIATE_FAILED",
            Self::ComputeExportNotFound => "COMPUTE_EXPORT_NOT_FOUND",
            Self::ComputeArgumentMismatch => "COMPUTE_ARGUMENT_MISMATCH",
            Self::ComputeCallFailed => "COMPUTE_CALL_FAILED",

            Self::WsConnectionFailed => "WS_CONNECTION_FAILED",
            Self::WsSendFailed => "WS_SEND_FAILED",
            Self::WsClosed => "WS_CLOSED",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiUnavailable => "API_UNAVAILABLE",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::AssetInvalidUrl
            | Self::ComputeArgumentMismatch
            | Self::ConfigInvalidValue => 400,
            Self::AssetPathRejected => 403,
            Self::ApiNotFound | Self::AssetNotFound | Self::ComputeExportNotFound => 404,
            Self::ApiUnavailable => 503,
            _ => 500,
        }
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Request URL could not be parsed
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AssetInvalidUrl, msg)
    }

    /// Path escapes the app root
    pub fn path_rejected(path: &str) -> Self {
        Self::new(
            ErrorCode::AssetPathRejected,
            format!("Path escapes app root: {}", path),
        )
    }

    /// Invalid lifecycle trigger
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LifecycleInvalidTransition, msg)
    }

    /// Export missing from the compute module
    pub fn export_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::ComputeExportNotFound,
            format!("Export not found: {}", name),
        )
    }

    /// Arguments don't fit the export
    pub fn argument_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ComputeArgumentMismatch, msg)
    }

    /// Invalid configuration value
    pub fn invalid_config(key: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {:?}", key, value),
        )
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::AssetNotFound,
            _ => ErrorCode::AssetReadFailed,
        };
        Self::with_source(code, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(ErrorCode::ComputeFetchFailed, err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                Self::new(ErrorCode::WsClosed, "WebSocket already closed")
            }
            other => Self::with_source(ErrorCode::WsSendFailed, "WebSocket error", other),
        }
    }
}
