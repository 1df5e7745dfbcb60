//! Common test utilities for roomlink-client integration tests
//!
//! This module provides a mock realtime server and helpers for testing
//! client behavior without needing a real server.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use roomlink_client::{ConnectionStatus, MessageListener, StatusListener};
use roomlink_core::InboundMessage;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
enum Command {
    Push(String),
    CloseAll,
}

/// Mock realtime server
///
/// Accepts WebSocket connections, records every text frame and request URI
/// it sees, and lets the test push frames to, or close, every live
/// connection.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    commands: broadcast::Sender<Command>,
    frames: Arc<Mutex<Vec<String>>>,
    uris: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl MockWsServer {
    /// Start a new mock server on an ephemeral port
    pub async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (commands, _) = broadcast::channel::<Command>(64);
        let frames = Arc::new(Mutex::new(Vec::new()));
        let uris = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let server = Self {
            addr,
            shutdown_tx,
            commands: commands.clone(),
            frames: Arc::clone(&frames),
            uris: Arc::clone(&uris),
            connections: Arc::clone(&connections),
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accept_result = listener.accept() => {
                        let Ok((stream, _)) = accept_result else { continue };
                        let mut command_rx = commands.subscribe();
                        let frames = Arc::clone(&frames);
                        let uris = Arc::clone(&uris);
                        let connections = Arc::clone(&connections);

                        tokio::spawn(async move {
                            let record_uri = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
                                uris.lock().unwrap().push(req.uri().to_string());
                                Ok(response)
                            };
                            let Ok(ws_stream) = accept_hdr_async(stream, record_uri).await else {
                                return;
                            };
                            connections.fetch_add(1, Ordering::SeqCst);
                            let (mut write, mut read) = ws_stream.split();

                            loop {
                                tokio::select! {
                                    msg = read.next() => match msg {
                                        Some(Ok(Message::Text(text))) => frames.lock().unwrap().push(text),
                                        // Keep reading so the close reply gets flushed
                                        Some(Ok(_)) => {}
                                        Some(Err(_)) | None => break,
                                    },
                                    command = command_rx.recv() => match command {
                                        Ok(Command::Push(text)) => {
                                            let _ = write.send(Message::Text(text)).await;
                                        }
                                        Ok(Command::CloseAll) | Err(_) => {
                                            let _ = write.send(Message::Close(None)).await;
                                            break;
                                        }
                                    },
                                }
                            }
                        });
                    }
                }
            }
        });

        server
    }

    /// Host and port for `ClientBuilder::new`
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Text frames received so far, across all connections
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    /// Received frames parsed as JSON
    pub fn json_frames(&self) -> Vec<serde_json::Value> {
        self.frames()
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect()
    }

    /// Request URIs of every accepted handshake
    pub fn uris(&self) -> Vec<String> {
        self.uris.lock().unwrap().clone()
    }

    /// Number of accepted connections
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Send a text frame to every live connection
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.commands.send(Command::Push(text.into()));
    }

    /// Close every live connection from the server side
    pub fn close_all(&self) {
        let _ = self.commands.send(Command::CloseAll);
    }

    /// Shutdown the mock server
    pub async fn shutdown(self) {
        self.close_all();
        let _ = self.shutdown_tx.send(()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Address nothing listens on
pub async fn dead_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

/// Poll `check` until it holds, failing the test after five seconds
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Status listener that records every status it sees
pub fn status_recorder() -> (StatusListener, Arc<Mutex<Vec<ConnectionStatus>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let listener = {
        let seen = Arc::clone(&seen);
        StatusListener::new(move |status| {
            seen.lock().unwrap().push(status);
            async {}
        })
    };
    (listener, seen)
}

/// Message listener that records every message it sees
pub fn message_recorder() -> (MessageListener, Arc<Mutex<Vec<InboundMessage>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let listener = {
        let seen = Arc::clone(&seen);
        MessageListener::new(move |message| {
            seen.lock().unwrap().push(message);
            async {}
        })
    };
    (listener, seen)
}

/// Count occurrences of `status`
pub fn count(seen: &Arc<Mutex<Vec<ConnectionStatus>>>, status: ConnectionStatus) -> usize {
    seen.lock().unwrap().iter().filter(|s| **s == status).count()
}
