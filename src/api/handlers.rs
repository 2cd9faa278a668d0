//! API Request Handlers

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Json, Path, State,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::types::*;
use crate::core::asset_protocol::AssetResolver;
use crate::core::bindings::ClickBindings;
use crate::core::headless::HeadlessHost;
use crate::models::errors::{AppError, ErrorCode};
use crate::models::types::UiState;
use crate::utils::constants::ECHO_REPLY;

type ErrorReply = (StatusCode, Json<ApiResponse<()>>);

/// Connected echo-socket peer
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub connected_at: DateTime<Utc>,
    pub messages: u64,
}

/// Shared application state
pub struct AppState {
    /// Serves the app root; `None` until a scheme is registered
    pub resolver: Option<Arc<AssetResolver>>,
    pub ui_state: UiState,
    pub bindings: Option<Arc<ClickBindings>>,
    pub peers: DashMap<Uuid, PeerInfo>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(resolver: Arc<AssetResolver>) -> Self {
        Self::with_resolver(Some(resolver))
    }

    /// State serving whatever the host registered. Without a registered
    /// scheme every asset request answers `API_UNAVAILABLE`.
    pub fn for_host(host: &HeadlessHost) -> Self {
        Self::with_resolver(host.resolver())
    }

    fn with_resolver(resolver: Option<Arc<AssetResolver>>) -> Self {
        Self {
            resolver,
            ui_state: UiState::default(),
            bindings: None,
            peers: DashMap::new(),
            start_time: Instant::now(),
        }
    }

    pub fn with_bindings(mut self, bindings: Arc<ClickBindings>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn error_reply(err: &AppError, start: Instant) -> ErrorReply {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(err), elapsed_ms(start))),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let bindings = state
        .bindings
        .as_ref()
        .map(|b| b.element_ids().into_iter().map(str::to_string).collect())
        .unwrap_or_default();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        ws_peers: state.peers.len(),
        bindings,
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// UI State
// ============================================

pub async fn ui_state(State(state): State<Arc<AppState>>) -> Json<ApiResponse<UiState>> {
    let start = Instant::now();
    Json(ApiResponse::success(state.ui_state.clone(), elapsed_ms(start)))
}

// ============================================
// Click Dispatch
// ============================================

pub async fn click(
    State(state): State<Arc<AppState>>,
    Path(element_id): Path<String>,
) -> Result<Json<ApiResponse<ClickData>>, ErrorReply> {
    let start = Instant::now();

    let Some(bindings) = state.bindings.clone() else {
        let err = AppError::new(ErrorCode::ApiUnavailable, "No compute module loaded");
        return Err(error_reply(&err, start));
    };

    // wasm calls are synchronous; keep them off the reactor.
    let id = element_id.clone();
    let outcome = tokio::task::spawn_blocking(move || bindings.dispatch(&id))
        .await
        .map_err(|e| {
            error!("❌ Click task failed: {}", e);
            error_reply(
                &AppError::new(ErrorCode::ComputeCallFailed, "Click task aborted"),
                start,
            )
        })?;

    match outcome {
        Ok(Some(outcome)) => Ok(Json(ApiResponse::success(
            ClickData::from(outcome),
            elapsed_ms(start),
        ))),
        Ok(None) => {
            let err = AppError::new(
                ErrorCode::ApiNotFound,
                format!("No binding for element '{}'", element_id),
            );
            Err(error_reply(&err, start))
        }
        Err(e) => {
            error!(element = %element_id, code = e.code_str(), "❌ Click failed: {}", e);
            Err(error_reply(&e, start))
        }
    }
}

// ============================================
// Static Assets (fallback)
// ============================================

pub async fn serve_asset(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let start = Instant::now();

    let Some(resolver) = state.resolver.as_ref() else {
        let err = AppError::new(ErrorCode::ApiUnavailable, "No app scheme registered");
        warn!(path = %uri.path(), "⚠️ Asset not served: {}", err);
        return error_reply(&err, start).into_response();
    };

    match resolver.resolve_async(uri.path()).await {
        Ok(asset) => {
            // Unmapped extensions go out without a Content-Type.
            let mut response = Response::new(Body::from(asset.data));
            if !asset.mime_type.is_empty() {
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    header::HeaderValue::from_static(asset.mime_type),
                );
            }
            response
        }
        Err(e) => {
            warn!(path = %uri.path(), code = e.code_str(), "⚠️ Asset not served: {}", e);
            error_reply(&e, start).into_response()
        }
    }
}

// ============================================
// WebSocket Echo
// ============================================

pub async fn ws_echo(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| echo_session(socket, state))
}

async fn echo_session(mut socket: WebSocket, state: Arc<AppState>) {
    let peer = Uuid::new_v4();
    state.peers.insert(
        peer,
        PeerInfo {
            connected_at: Utc::now(),
            messages: 0,
        },
    );
    info!("🔌 Peer {} connected ({} online)", peer, state.peers.len());

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(data)) => format!("<{} bytes>", data.len()),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("Peer {} socket error: {}", peer, e);
                break;
            }
        };

        info!("📨 {}: {}", peer, text);
        if let Some(mut info) = state.peers.get_mut(&peer) {
            info.messages += 1;
        }

        if let Err(e) = socket.send(Message::Text(ECHO_REPLY.to_string())).await {
            warn!("⚠️ Reply to {} failed: {}", peer, e);
            break;
        }
    }

    if let Some((_, info)) = state.peers.remove(&peer) {
        info!(
            "🔌 Peer {} disconnected after {} messages (since {})",
            peer, info.messages, info.connected_at
        );
    }
}
