//! # wsevents-server
//!
//! Connection registry and broadcast dispatcher for WebSocket clients.
//!
//! - [`hub`]: single-task registry owning every live connection's outbound buffer
//! - [`websocket`]: per-connection pumps and the transport seam
//! - [`handlers`]: per-event-name hooks run before broadcast
//! - [`server`]: Axum router for `/ws`, `/health`, `/metrics` and static files
//! - [`config`], [`metrics`], [`shutdown`]: ambient server plumbing

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod hub;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use handlers::{EventHandler, HandlerRegistry};
pub use hub::Hub;
pub use server::WseventsServer;
