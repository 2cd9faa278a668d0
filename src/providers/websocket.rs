//! WebSocket Client Module
//!
//! Connects to the UI server's socket, sends the greeting once on open and
//! logs every inbound message. Events are delivered through an owned
//! [`WsConnection`] handle instead of global callbacks; dropping the handle
//! tears the connection down.
//!
//! No reconnection, heartbeat or framing: one connection, run to completion.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::models::config::ShellConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{InboundMessage, MessagePayload};
use crate::utils::constants::WS_EVENT_BUFFER;

/// How long `close` waits for the server's close frame
const WS_CLOSE_TIMEOUT_SECS: u64 = 5;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================
// EVENT TYPES
// ============================================

/// Event delivered to the connection handle
#[derive(Debug, Clone)]
pub enum WsEvent {
    Connected,
    Message(InboundMessage),
    Disconnected,
    Error(String),
}

// ============================================
// WEBSOCKET CLIENT
// ============================================

/// Greeting WebSocket client
#[derive(Debug, Clone)]
pub struct WsClient {
    url: String,
    greeting: String,
}

impl WsClient {
    pub fn new(url: impl Into<String>, greeting: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            greeting: greeting.into(),
        }
    }

    pub fn from_config(config: &ShellConfig) -> Self {
        Self::new(&config.ws_url, &config.greeting)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the socket and send the greeting exactly once
    pub async fn connect(&self) -> AppResult<WsConnection> {
        let (ws_stream, _) = connect_async(self.url.as_str()).await.map_err(|e| {
            AppError::with_source(
                ErrorCode::WsConnectionFailed,
                format!("Cannot connect to {}", self.url),
                e,
            )
        })?;
        info!("🔌 WebSocket connected to {}", self.url);

        let (mut write, read) = ws_stream.split();
        write.send(Message::Text(self.greeting.clone())).await?;
        debug!("👋 Greeting sent: {}", self.greeting);

        let (event_tx, event_rx) = mpsc::channel(WS_EVENT_BUFFER);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        // Capacity is fresh, so this cannot fail.
        let _ = event_tx.try_send(WsEvent::Connected);

        let task = tokio::spawn(Self::run_connection(
            write,
            read,
            outbound_rx,
            event_tx,
            open.clone(),
        ));

        Ok(WsConnection {
            url: self.url.clone(),
            events: event_rx,
            outbound: outbound_tx,
            open,
            task: Some(task),
        })
    }

    /// Internal: pump outbound frames and inbound messages until either side closes
    async fn run_connection(
        mut write: SplitSink<WsStream, Message>,
        mut read: SplitStream<WsStream>,
        mut outbound: mpsc::UnboundedReceiver<Message>,
        events: mpsc::Sender<WsEvent>,
        open: Arc<AtomicBool>,
    ) {
        let mut sequence: u64 = 0;

        loop {
            tokio::select! {
                frame = outbound.recv() => {
                    // `close` sends an explicit frame; a dropped handle aborts this task.
                    let Some(frame) = frame else { break };
                    if let Err(e) = write.send(frame).await {
                        error!("❌ WebSocket send failed: {}", e);
                        let _ = events.send(WsEvent::Error(e.to_string())).await;
                        break;
                    }
                }
                inbound = read.next() => {
                    let payload = match inbound {
                        Some(Ok(Message::Text(text))) => MessagePayload::Text(text),
                        Some(Ok(Message::Binary(data))) => MessagePayload::Binary(data),
                        Some(Ok(Message::Close(_))) => {
                            info!("🔌 WebSocket closed by server");
                            break;
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            error!("❌ WebSocket error: {}", e);
                            let _ = events.send(WsEvent::Error(e.to_string())).await;
                            break;
                        }
                        None => break,
                    };

                    info!("message: {}", payload);
                    let message = InboundMessage {
                        sequence,
                        payload,
                        received_at: chrono::Utc::now(),
                    };
                    sequence += 1;

                    if events.send(WsEvent::Message(message)).await.is_err() {
                        debug!("📪 Handle dropped, stopping connection");
                        break;
                    }
                }
            }
        }

        open.store(false, Ordering::SeqCst);
        let _ = events.send(WsEvent::Disconnected).await;
    }
}

// ============================================
// CONNECTION HANDLE
// ============================================

/// Owned handle to one live connection
pub struct WsConnection {
    url: String,
    events: mpsc::Receiver<WsEvent>,
    outbound: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WsConnection {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Next event, `None` once the connection task has finished
    pub async fn next_event(&mut self) -> Option<WsEvent> {
        self.events.recv().await
    }

    /// Next inbound message, skipping lifecycle events.
    /// `None` once the connection is gone.
    pub async fn next_message(&mut self) -> Option<InboundMessage> {
        while let Some(event) = self.events.recv().await {
            match event {
                WsEvent::Message(message) => return Some(message),
                WsEvent::Connected => continue,
                WsEvent::Disconnected | WsEvent::Error(_) => return None,
            }
        }
        None
    }

    /// Queue a text frame
    pub fn send(&self, text: impl Into<String>) -> AppResult<()> {
        if !self.is_open() {
            return Err(AppError::new(ErrorCode::WsClosed, "WebSocket already closed"));
        }
        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_| AppError::new(ErrorCode::WsClosed, "WebSocket already closed"))
    }

    /// Send a close frame and wait for the connection task to finish
    pub async fn close(mut self) -> AppResult<()> {
        let _ = self.outbound.send(Message::Close(None));

        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            match tokio::time::timeout(Duration::from_secs(WS_CLOSE_TIMEOUT_SECS), task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("⚠️ WebSocket task ended abnormally: {}", e),
                Err(_) => {
                    warn!("⚠️ No close frame from {}, dropping connection", self.url);
                    abort.abort();
                }
            }
        }
        info!("🔌 WebSocket to {} closed", self.url);
        Ok(())
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_from_config() {
        let client = WsClient::from_config(&ShellConfig::default());
        assert_eq!(client.url(), "ws://127.0.0.1:3013");
        assert_eq!(client.greeting, "thefux says hello");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Port 9 (discard) is practically never listening on loopback.
        let client = WsClient::new("ws://127.0.0.1:9", "hi");
        let err = client.connect().await.err().unwrap();
        assert_eq!(err.code, ErrorCode::WsConnectionFailed);
    }
}
