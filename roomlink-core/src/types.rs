//! Realtime frame types
//!
//! The realtime transport carries two kinds of JSON objects:
//!
//! 1. **Outbound frames**: subscription changes sent by the client
//!    (`{"type":"join"|"leave","room":..,"event":..}`)
//! 2. **Inbound messages**: server pushes addressed to a room and event
//!    (`{"room":..,"event":..,"data":..}`)
//!
//! Inbound frames that do not carry all three of `room`, `event` and `data`
//! are kept as opaque payloads. They are never dispatched to room listeners.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an outbound subscription frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Start receiving a room (or one event of a room)
    Join,
    /// Stop receiving a room (or one event of a room)
    Leave,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Join => write!(f, "join"),
            FrameKind::Leave => write!(f, "leave"),
        }
    }
}

/// A subscription change sent to the server
///
/// When `event` is `None` the field is omitted from the JSON object, and the
/// server treats the frame as addressing the room's unqualified stream.
///
/// # Examples
///
/// ```rust
/// use roomlink_core::{FrameKind, OutboundFrame};
///
/// let frame = OutboundFrame::leave("lobby", None);
/// assert_eq!(frame.kind, FrameKind::Leave);
/// assert!(frame.event.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// `join` or `leave`
    #[serde(rename = "type")]
    pub kind: FrameKind,

    /// Room identifier
    pub room: String,

    /// Optional event within the room
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl OutboundFrame {
    /// Create a frame of the given kind
    pub fn new(kind: FrameKind, room: impl Into<String>, event: Option<&str>) -> Self {
        Self {
            kind,
            room: room.into(),
            event: event.map(str::to_string),
        }
    }

    /// Create a `join` frame
    pub fn join(room: impl Into<String>, event: Option<&str>) -> Self {
        Self::new(FrameKind::Join, room, event)
    }

    /// Create a `leave` frame
    pub fn leave(room: impl Into<String>, event: Option<&str>) -> Self {
        Self::new(FrameKind::Leave, room, event)
    }
}

/// A server push addressed to a room and event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Room the message was published to
    pub room: String,
    /// Event name within the room
    pub event: String,
    /// Message payload
    pub data: serde_json::Value,
}

impl InboundMessage {
    /// Create a new inbound message
    pub fn new(room: impl Into<String>, event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            room: room.into(),
            event: event.into(),
            data,
        }
    }
}

/// Result of decoding one inbound frame
///
/// Decoding never fails: anything that isn't an addressed message is kept
/// as an opaque value so callers can log it.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Frame carried `room`, `event` and `data`
    Addressed(InboundMessage),
    /// Frame parsed as JSON but lacked an address, or did not parse at all
    /// (in which case the raw text is wrapped as a JSON string)
    Unaddressed(serde_json::Value),
}

impl Inbound {
    /// Returns the addressed message, if any
    pub fn addressed(&self) -> Option<&InboundMessage> {
        match self {
            Inbound::Addressed(msg) => Some(msg),
            Inbound::Unaddressed(_) => None,
        }
    }

    /// Check if this frame can be dispatched to room listeners
    pub fn is_addressed(&self) -> bool {
        matches!(self, Inbound::Addressed(_))
    }
}
