//! # wsevents-core
//!
//! Shared vocabulary for the wsevents broadcast hub.
//!
//! - **Events**: [`Event`] with a name and an opaque [`Payload`], plus the JSON wire codec
//! - **IDs**: [`ConnectionId`] newtype for live client sessions
//! - **Errors**: [`EventError`] for decode/encode failures via `thiserror`
//! - **Logging**: `tracing` subscriber setup shared by the server and binary

#![deny(unsafe_code)]

pub mod errors;
pub mod event;
pub mod ids;
pub mod logging;

pub use errors::EventError;
pub use event::{Event, Payload};
pub use ids::ConnectionId;
