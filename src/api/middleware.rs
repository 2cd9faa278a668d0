//! API Middleware (request logging)

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Request logging middleware.
///
/// API calls log at info, asset fetches at debug; failures always warn.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let latency_ms = start.elapsed().as_millis();
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %latency_ms,
            "Request failed"
        );
    } else if uri.path().starts_with("/v1") || uri.path() == "/health" {
        info!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %latency_ms,
            "Request completed"
        );
    } else {
        debug!(uri = %uri, status = %status.as_u16(), latency_ms = %latency_ms, "Asset served");
    }

    response
}
