//! The hub's view of one live connection.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wsevents_core::Event;

/// Receiving end of a connection's outbound buffer, drained by its outbound pump.
pub type OutboundReceiver = mpsc::Receiver<Arc<Event>>;

/// What the hub holds for each live connection.
///
/// The member owns the only sender of the outbound buffer, so dropping it
/// closes the buffer. The teardown token is shared with the connection's
/// pumps and lets the hub stop them without touching the transport.
pub struct Member {
    outbound: mpsc::Sender<Arc<Event>>,
    teardown: CancellationToken,
}

impl Member {
    /// Create a member and the receiver for its outbound buffer.
    ///
    /// `capacity` is clamped to at least one slot.
    pub fn channel(capacity: usize, teardown: CancellationToken) -> (Self, OutboundReceiver) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        (Self { outbound, teardown }, rx)
    }

    pub(crate) fn try_deliver(
        &self,
        event: &Arc<Event>,
    ) -> Result<(), mpsc::error::TrySendError<Arc<Event>>> {
        self.outbound.try_send(Arc::clone(event))
    }

    pub(crate) fn tear_down(&self) {
        self.teardown.cancel();
    }
}
