//! Codec for realtime frames
//!
//! Outbound frames are encoded strictly: a frame that fails to serialize is
//! an error. Inbound frames are decoded leniently: the server may push
//! anything, and only objects carrying `room`, `event` and `data` keys are
//! considered addressed. Everything else is returned as
//! [`Inbound::Unaddressed`] rather than as an error.
//!
//! # Examples
//!
//! ```rust
//! use roomlink_core::{codec, Inbound};
//!
//! match codec::decode_inbound("not json") {
//!     Inbound::Unaddressed(raw) => assert_eq!(raw, "not json"),
//!     Inbound::Addressed(_) => unreachable!(),
//! }
//! ```

use crate::error::{Error, Result};
use crate::types::{Inbound, InboundMessage, OutboundFrame};
use serde::Serialize;
use serde_json::Value;

/// Encode any serializable value to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode an outbound subscription frame
pub fn encode_frame(frame: &OutboundFrame) -> Result<String> {
    encode(frame)
}

/// Decode one inbound text frame
///
/// - Invalid JSON is wrapped as a JSON string holding the raw text
/// - A JSON object with string `room`, string `event` and a `data` key
///   (of any value, `null` included) becomes [`Inbound::Addressed`]
/// - Any other JSON value is returned as-is in [`Inbound::Unaddressed`]
pub fn decode_inbound(text: &str) -> Inbound {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Inbound::Unaddressed(Value::String(text.to_string())),
    };

    match address_of(&value) {
        Some((room, event)) => {
            let data = value.get("data").cloned().unwrap_or(Value::Null);
            Inbound::Addressed(InboundMessage::new(room, event, data))
        }
        None => Inbound::Unaddressed(value),
    }
}

fn address_of(value: &Value) -> Option<(String, String)> {
    let object = value.as_object()?;
    if !object.contains_key("data") {
        return None;
    }
    let room = object.get("room")?.as_str()?;
    let event = object.get("event")?.as_str()?;
    Some((room.to_string(), event.to_string()))
}
