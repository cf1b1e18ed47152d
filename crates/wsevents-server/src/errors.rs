//! Server error types.

use thiserror::Error;

/// Errors from a transport half (the receive or send side of one client).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer is gone and no more frames can be exchanged.
    #[error("transport closed")]
    Closed,
    /// The underlying WebSocket reported a protocol or I/O failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] axum::Error),
}

/// Errors returned by [`Hub`](crate::hub::Hub) handles.
///
/// The control loop itself has no failure path; the only error a caller can
/// observe is that the loop is no longer running.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    /// The control loop has stopped and no longer accepts requests.
    #[error("hub control loop has stopped")]
    Stopped,
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the config file.
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A config value was invalid (e.g., zero capacity).
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}
