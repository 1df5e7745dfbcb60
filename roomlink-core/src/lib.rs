//! Core types and codec for roomlink
//!
//! This crate provides the pieces shared by the realtime socket client and
//! the request/response caller:
//!
//! - **Types**: Outbound subscription frames and inbound room messages
//! - **Codec**: Encoding of outbound frames, lenient decoding of inbound frames
//! - **Error handling**: The error type used by the realtime client
//! - **Observability**: `tracing` + OpenTelemetry bootstrap
//!
//! # Wire Format
//!
//! The realtime transport speaks plain JSON objects. The client sends
//! subscription changes:
//!
//! ```json
//! {"type":"join","room":"orders","event":"created"}
//! {"type":"leave","room":"orders"}
//! ```
//!
//! and the server pushes addressed messages:
//!
//! ```json
//! {"room":"orders","event":"created","data":{"id":7}}
//! ```
//!
//! # Example
//!
//! ```rust
//! use roomlink_core::{codec, Inbound, OutboundFrame};
//!
//! let frame = OutboundFrame::join("orders", Some("created"));
//! let json = codec::encode_frame(&frame).unwrap();
//! assert_eq!(json, r#"{"type":"join","room":"orders","event":"created"}"#);
//!
//! let inbound = codec::decode_inbound(r#"{"room":"orders","event":"created","data":1}"#);
//! assert!(matches!(inbound, Inbound::Addressed(_)));
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use error::{Error, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{FrameKind, Inbound, InboundMessage, OutboundFrame};
