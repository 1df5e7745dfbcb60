//! Roomlink - realtime room subscriptions and request/response calls
//!
//! This is the main convenience crate that re-exports all roomlink sub-crates.
//! Use this crate if you want a single dependency for both the realtime
//! client and the request caller.
//!
//! # Architecture
//!
//! Roomlink is organized into modular crates:
//!
//! - **roomlink-core**: Wire frames, codec, error handling, observability
//! - **roomlink-client**: Realtime WebSocket client with room subscriptions and reconnection
//! - **roomlink-rpc**: Group/action request caller with a notification side channel
//!
//! # Quick Start - Realtime
//!
//! ```rust,no_run
//! use roomlink::{ClientBuilder, MessageListener};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::for_page("https://app.example.com/")?.build()?;
//!
//!     client.join("orders", Some("created")).await;
//!     client
//!         .on_message(&MessageListener::new(|msg| async move {
//!             println!("{}/{}: {}", msg.room, msg.event, msg.data);
//!         }))
//!         .await;
//!
//!     client.connect(Some("secret-token")).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Calls
//!
//! ```rust,no_run
//! use roomlink::RequestCaller;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = RequestCaller::builder().host("https://app.example.com/api").build()?;
//!
//!     let order = api.call("orders", "get", Some(json!({"id": 42}))).await;
//!     println!("Order: {}", order);
//!
//!     Ok(())
//! }
//! ```

// Re-export all public APIs from sub-crates
pub use roomlink_client as client;
pub use roomlink_core as core;
pub use roomlink_rpc as rpc;

// Convenience re-exports of the most commonly used types
pub use roomlink_client::{ClientBuilder, MessageListener, RealtimeClient, StatusListener};
pub use roomlink_rpc::{Notification, RequestCaller};
