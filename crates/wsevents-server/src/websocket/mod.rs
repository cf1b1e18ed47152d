//! WebSocket connections: transport seam, inbound/outbound pumps, and the
//! axum socket adapter.

pub mod connection;
pub mod transport;
