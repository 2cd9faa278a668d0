//! WebSocket client and echo server tests
//!
//! Every test binds its own loopback port, so they run in parallel.

use barracuda_shell::api::{create_ws_router, AppState};
use barracuda_shell::models::MessagePayload;
use barracuda_shell::{AssetResolver, WsClient, WsEvent};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Scripted server: sends `replies` after the first frame, then counts every
/// text frame until the client closes.
async fn scripted_server(replies: &'static [&'static str]) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut received = Vec::new();

        while let Some(Ok(frame)) = ws.next().await {
            match frame {
                Message::Text(text) => {
                    let first = received.is_empty();
                    received.push(text);
                    if first {
                        for reply in replies {
                            ws.send(Message::Text(reply.to_string())).await.unwrap();
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        received
    });

    (url, handle)
}

#[tokio::test]
async fn test_greeting_sent_exactly_once() {
    let (url, server) = scripted_server(&[]).await;
    let connection = WsClient::new(&url, "thefux says hello").connect().await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    connection.close().await.unwrap();

    let received = tokio::time::timeout(TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(received, vec!["thefux says hello".to_string()]);
}

#[tokio::test]
async fn test_messages_delivered_in_order() {
    let (url, server) = scripted_server(&["one", "two", "three"]).await;
    let mut connection = WsClient::new(&url, "hi").connect().await.unwrap();

    assert!(matches!(
        tokio::time::timeout(TIMEOUT, connection.next_event()).await.unwrap(),
        Some(WsEvent::Connected)
    ));

    let mut seen = Vec::new();
    for _ in 0..3 {
        let message = tokio::time::timeout(TIMEOUT, connection.next_message())
            .await
            .unwrap()
            .unwrap();
        seen.push((message.sequence, message.payload));
    }

    assert_eq!(
        seen,
        vec![
            (0, MessagePayload::Text("one".into())),
            (1, MessagePayload::Text("two".into())),
            (2, MessagePayload::Text("three".into())),
        ]
    );

    connection.close().await.unwrap();
    let received = tokio::time::timeout(TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn test_client_against_echo_server() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(Arc::new(AssetResolver::new(dir.path(), "app"))));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let app = create_ws_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut connection = WsClient::new(&url, "thefux says hello").connect().await.unwrap();

    let reply = tokio::time::timeout(TIMEOUT, connection.next_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.payload, MessagePayload::Text("send message back".into()));
    assert_eq!(state.peers.len(), 1);

    connection.send("again").unwrap();
    let second = tokio::time::timeout(TIMEOUT, connection.next_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.sequence, 1);

    connection.close().await.unwrap();
}

#[tokio::test]
async fn test_server_close_ends_event_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _greeting = ws.next().await;
        ws.close(None).await.unwrap();
    });

    let mut connection = WsClient::new(&url, "hi").connect().await.unwrap();

    let mut saw_disconnect = false;
    while let Ok(Some(event)) = tokio::time::timeout(TIMEOUT, connection.next_event()).await {
        if matches!(event, WsEvent::Disconnected) {
            saw_disconnect = true;
            break;
        }
    }

    assert!(saw_disconnect);
    assert!(!connection.is_open());
    assert!(connection.send("late").is_err());
}

#[tokio::test]
async fn test_ping_answered_once() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _greeting = ws.next().await;
        ws.send(Message::Ping(b"hb".to_vec())).await.unwrap();
        ws.send(Message::Text("after".into())).await.unwrap();

        let mut pongs = 0;
        while let Some(Ok(frame)) = ws.next().await {
            match frame {
                Message::Pong(data) => {
                    assert_eq!(data, b"hb");
                    pongs += 1;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        pongs
    });

    let mut connection = WsClient::new(&url, "hi").connect().await.unwrap();
    let message = tokio::time::timeout(TIMEOUT, connection.next_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.payload, MessagePayload::Text("after".into()));
    assert_eq!(message.sequence, 0);

    connection.close().await.unwrap();
    let pongs = tokio::time::timeout(TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(pongs, 1);
}

#[tokio::test]
async fn test_dropped_handle_closes_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _greeting = ws.next().await;
        // Runs until the peer goes away, cleanly or not.
        while let Some(Ok(frame)) = ws.next().await {
            if frame.is_close() {
                break;
            }
        }
    });

    let connection = WsClient::new(&url, "hi").connect().await.unwrap();
    drop(connection);

    tokio::time::timeout(TIMEOUT, server).await.unwrap().unwrap();
}
