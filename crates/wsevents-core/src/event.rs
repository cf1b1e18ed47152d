//! The broadcast event and its JSON wire format.
//!
//! On the wire an event is an object with two recognized keys:
//!
//! ```json
//! { "eventName": "chat", "data": { "msg": "hi" } }
//! ```
//!
//! Missing keys fall back to an empty name and a null payload, and unknown
//! keys are ignored. Anything other than a JSON object fails to decode.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::errors::{EventError, Result};

/// Arbitrary structured event data: null, bool, number, string, sequence or
/// string-keyed map. Opaque to the dispatcher.
pub type Payload = serde_json::Value;

/// A named unit of data broadcast to every connected client.
///
/// Events are immutable once built; the hub shares one allocation between
/// all recipients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "eventName", default)]
    name: String,
    #[serde(rename = "data", default)]
    payload: Payload,
}

impl Event {
    /// Build an event from a name and payload.
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Event name. Not required to be unique or structured.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Event payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Split into name and payload.
    pub fn into_parts(self) -> (String, Payload) {
        (self.name, self.payload)
    }

    /// Decode one inbound text message.
    ///
    /// Only a top-level JSON object is an event. Arrays are rejected rather
    /// than mapped onto the fields in order.
    pub fn decode(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(EventError::Decode)?;
        if !value.is_object() {
            return Err(EventError::Decode(serde_json::Error::custom(
                "event must be a JSON object",
            )));
        }
        serde_json::from_value(value).map_err(EventError::Decode)
    }

    /// Encode for the wire.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(EventError::Encode)
    }
}
