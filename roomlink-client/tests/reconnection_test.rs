//! Reconnection integration tests

mod common;

use common::{count, dead_host, status_recorder, wait_until, MockWsServer};
use roomlink_client::{ClientBuilder, ConnectionStatus, FixedInterval, StatusListener};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fast_retry(max_attempts: u32) -> Box<FixedInterval> {
    Box::new(FixedInterval::new(Duration::from_millis(10)).with_max_attempts(max_attempts))
}

#[tokio::test]
async fn test_reconnect_replays_subscriptions() {
    let server = MockWsServer::new().await;
    let client = ClientBuilder::new(server.host())
        .with_reconnect(fast_retry(100))
        .build()
        .unwrap();

    client.join("orders", Some("created")).await;
    client.connect(Some("abc")).await.unwrap();
    wait_until(|| async { server.frames().len() == 1 }).await;

    server.close_all();
    wait_until(|| async { server.frames().len() == 2 }).await;

    let frames = server.json_frames();
    assert_eq!(frames[0], json!({"type": "join", "room": "orders", "event": "created"}));
    assert_eq!(frames[0], frames[1]);
    assert_eq!(server.connections(), 2);

    // The token is remembered across reconnects
    assert_eq!(
        server.uris(),
        vec!["/ws?authToken=abc".to_string(), "/ws?authToken=abc".to_string()]
    );

    assert!(client.is_connected().await);
    assert_eq!(client.reconnect_attempts(), 0);

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_attempt_ceiling_against_dead_host() {
    let client = ClientBuilder::new(dead_host().await)
        .with_reconnect(fast_retry(3))
        .build()
        .unwrap();
    let (listener, seen) = status_recorder();
    client.on_status_change(&listener).await;

    client.connect(None).await.unwrap();

    // One initial attempt plus three retries
    wait_until(|| async { count(&seen, ConnectionStatus::Closed) == 4 }).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(count(&seen, ConnectionStatus::Connecting), 4);
    assert_eq!(count(&seen, ConnectionStatus::Error), 4);
    assert_eq!(count(&seen, ConnectionStatus::Closed), 4);
    assert_eq!(client.reconnect_attempts(), 3);
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_explicit_connect_restores_retry_budget() {
    let client = ClientBuilder::new(dead_host().await)
        .with_reconnect(fast_retry(1))
        .build()
        .unwrap();
    let (listener, seen) = status_recorder();
    client.on_status_change(&listener).await;

    client.connect(None).await.unwrap();
    wait_until(|| async { count(&seen, ConnectionStatus::Closed) == 2 }).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.reconnect_attempts(), 1);

    client.connect(None).await.unwrap();
    wait_until(|| async { count(&seen, ConnectionStatus::Closed) == 4 }).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(count(&seen, ConnectionStatus::Connecting), 4);
}

#[tokio::test]
async fn test_without_reconnect_stays_closed() {
    let server = MockWsServer::new().await;
    let client = ClientBuilder::new(server.host())
        .without_reconnect()
        .build()
        .unwrap();

    client.connect(None).await.unwrap();
    wait_until(|| async { client.is_connected().await }).await;

    server.close_all();
    wait_until(|| async { client.is_closed().await }).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(client.is_closed().await);
    assert_eq!(server.connections(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_during_retry_stops_loop() {
    let client = ClientBuilder::new(dead_host().await)
        .with_reconnect(Box::new(FixedInterval::new(Duration::from_millis(20))))
        .build()
        .unwrap();
    let (listener, seen) = status_recorder();
    client.on_status_change(&listener).await;

    client.connect(None).await.unwrap();
    wait_until(|| async { count(&seen, ConnectionStatus::Closed) >= 2 }).await;

    client.disconnect().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = seen.lock().unwrap().len();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(seen.lock().unwrap().len(), settled);
}

#[tokio::test]
async fn test_connect_during_retry_keeps_a_single_loop() {
    let interval = Duration::from_millis(50);
    let client = ClientBuilder::new(dead_host().await)
        .with_reconnect(Box::new(FixedInterval::new(interval)))
        .build()
        .unwrap();
    let (listener, seen) = status_recorder();
    client.on_status_change(&listener).await;

    client.connect(None).await.unwrap();
    wait_until(|| async { count(&seen, ConnectionStatus::Connecting) >= 3 }).await;

    // Retry loop is running; a manual connect must replace it, not add one
    client.connect(None).await.unwrap();
    let before = count(&seen, ConnectionStatus::Connecting);
    tokio::time::sleep(interval * 10).await;
    let during = count(&seen, ConnectionStatus::Connecting) - before;

    // One loop yields about ten attempts in this window, two loops about twenty
    assert!(during >= 5, "retries stalled: {}", during);
    assert!(during <= 13, "more than one retry loop: {}", during);

    client.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_from_connecting_listener_during_retry() {
    let client = ClientBuilder::new(dead_host().await)
        .with_reconnect(Box::new(FixedInterval::new(Duration::from_millis(10))))
        .build()
        .unwrap();
    let (recorder, seen) = status_recorder();
    client.on_status_change(&recorder).await;

    let connecting = Arc::new(AtomicUsize::new(0));
    let stop_on_retry = {
        let client = client.clone();
        let connecting = Arc::clone(&connecting);
        StatusListener::new(move |status| {
            let client = client.clone();
            let connecting = Arc::clone(&connecting);
            async move {
                if status == ConnectionStatus::Connecting
                    && connecting.fetch_add(1, Ordering::SeqCst) == 1
                {
                    client.disconnect().await;
                }
            }
        })
    };
    client.on_status_change(&stop_on_retry).await;

    client.connect(None).await.unwrap();
    wait_until(|| async { client.is_closed().await && count(&seen, ConnectionStatus::Connecting) == 2 }).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(client.is_closed().await);
    assert_eq!(count(&seen, ConnectionStatus::Connecting), 2);
    assert_eq!(seen.lock().unwrap().last(), Some(&ConnectionStatus::Closed));
}
