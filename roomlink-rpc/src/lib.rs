//! Request/response calls with a notification side channel
//!
//! [`RequestCaller`] posts `group`/`action` calls to a single endpoint and
//! turns every failure into a [`Notification`] instead of an error, so UI
//! code can simply await the result. See [`RequestCaller`] for the exact
//! rules.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use roomlink_rpc::{Notification, RequestCaller};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = RequestCaller::builder()
//!         .host("https://app.example.com/api")
//!         .notifier(|n: &Notification| eprintln!("[{}] {}", n.title, n.message_text()))
//!         .build()?;
//!
//!     // `{}` if anything went wrong; the notifier has been told why
//!     let order = api.call("orders", "get", Some(json!({"id": 42}))).await;
//!     println!("{}", order);
//!
//!     // Or look at the failure yourself
//!     if let Err(e) = api.try_call("orders", "delete", Some(json!({"id": 42}))).await {
//!         println!("delete failed: {}", e);
//!     }
//!     Ok(())
//! }
//! ```

mod builder;
mod caller;
mod error;
mod metrics;
mod navigator;
mod notification;

pub use builder::{RequestCallerBuilder, DEFAULT_HOST};
pub use caller::{RequestCaller, AUTH_CHECK_ACTION, AUTH_GROUP};
pub use error::{CallError, CallResult};
pub use metrics::RpcMetrics;
pub use navigator::{LogNavigator, Navigator, DEFAULT_LOCATION};
pub use notification::{
    LogNotifier, Notification, NotificationKind, Notifier, API_ERROR_TITLE, NETWORK_ERROR_TITLE,
};
