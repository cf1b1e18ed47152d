//! Connection registry and broadcast dispatcher.
//!
//! One control loop task owns the live connection set. Connections, the
//! HTTP layer and integrators reach it only through a cloneable [`Hub`]
//! handle that sends [`Command`](command::Command)s over a bounded intake,
//! so register, unregister and broadcast requests are applied strictly one
//! after another.
//!
//! Fan-out uses `try_send` on each recipient's outbound buffer. A recipient
//! whose buffer is full is disconnected instead of being waited on.

pub(crate) mod command;
pub mod dispatcher;
pub mod handle;
pub mod member;

pub use dispatcher::{BroadcastReport, Dispatcher};
pub use handle::Hub;
pub use member::{Member, OutboundReceiver};
