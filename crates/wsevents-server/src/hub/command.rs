//! Requests accepted by the hub control loop.

use std::sync::Arc;

use tokio::sync::oneshot;
use wsevents_core::{ConnectionId, Event};

use super::member::Member;

/// One request on the hub intake.
pub(crate) enum Command {
    /// Add a connection to the live set.
    Register { id: ConnectionId, member: Member },
    /// Remove a connection if present and close its outbound buffer.
    Unregister { id: ConnectionId },
    /// Offer a shared event to every live connection.
    Broadcast { event: Arc<Event> },
    /// Report the live set size.
    Count { reply: oneshot::Sender<usize> },
    /// Report whether a connection is live.
    Contains {
        id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },
}
