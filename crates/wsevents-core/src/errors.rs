//! Event codec error types.

use thiserror::Error;

/// Errors raised while converting between [`Event`](crate::Event) and its
/// wire representation.
#[derive(Debug, Error)]
pub enum EventError {
    /// Inbound text was not a valid event object.
    #[error("failed to decode event: {0}")]
    Decode(#[source] serde_json::Error),
    /// An event could not be serialized for the wire.
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for event codec operations.
pub type Result<T> = std::result::Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err = EventError::Decode(json_err);
        assert!(err.to_string().starts_with("failed to decode event"));
    }

    #[test]
    fn encode_error_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("").unwrap_err();
        let err = EventError::Encode(json_err);
        assert!(err.to_string().starts_with("failed to encode event"));
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;
        let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err = EventError::Decode(json_err);
        assert!(err.source().is_some());
    }
}
