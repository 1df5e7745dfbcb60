//! Realtime room subscription client over WebSocket
//!
//! This crate maintains a single WebSocket connection to a realtime server,
//! remembers which rooms and events the caller wants, and delivers server
//! pushes to registered listeners.
//!
//! # Core Features
//!
//! - **Desired subscriptions**: `join`/`leave` update a local set that survives
//!   disconnects and is replayed in full whenever a connection opens
//! - **Auto-Reconnection**: a single retry loop, fixed 1s interval and 1000
//!   attempts by default, with pluggable strategies
//! - **Listeners**: identity-based message and status listeners, isolated from
//!   each other's panics
//! - **Observability**: OpenTelemetry integration for traces and metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use roomlink_client::{ClientBuilder, MessageListener, StatusListener};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("localhost:8080").build()?;
//!
//!     // Subscriptions made before connecting are replayed on open
//!     client.join("orders", Some("created")).await;
//!     client.join("lobby", None).await;
//!
//!     let messages = MessageListener::new(|msg| async move {
//!         println!("{}/{}: {}", msg.room, msg.event, msg.data);
//!     });
//!     client.on_message(&messages).await;
//!
//!     let status = StatusListener::new(|status| async move {
//!         println!("connection is {}", status);
//!     });
//!     client.on_status_change(&status).await;
//!
//!     client.connect(Some("secret-token")).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod client_builder;
mod connection_state;
mod endpoint;
mod listener;
mod metrics;
mod reconnect;
mod subscription;

pub use client::RealtimeClient;
pub use client_builder::ClientBuilder;
pub use connection_state::{ConnectionManager, ConnectionState, ConnectionStatus};
pub use endpoint::{Endpoint, AUTH_TOKEN_PARAM, DEFAULT_PATH};
pub use listener::{Listener, ListenerFn, ListenerRegistry, MessageListener, StatusListener};
pub use metrics::ClientMetrics;
pub use reconnect::{
    ExponentialBackoff, FixedInterval, NoReconnect, ReconnectionStrategy,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL,
};
pub use subscription::{Subscription, Subscriptions};

pub use roomlink_core::{Error, InboundMessage, Result};
