//! Live connection set and the fan-out policy.
//!
//! [`Dispatcher`] is plain owned state with synchronous operations; the hub
//! task drives it from [`Dispatcher::run`]. Nothing else ever holds a
//! reference to it.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use wsevents_core::{ConnectionId, Event};

use super::command::Command;
use super::member::Member;
use crate::metrics::{WS_BROADCAST_DROPS_TOTAL, WS_CONNECTIONS_ACTIVE, WS_EVENTS_BROADCAST_TOTAL};

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients whose buffer accepted the event.
    pub delivered: usize,
    /// Recipients removed because their buffer was full or closed.
    pub dropped: Vec<ConnectionId>,
}

/// The live connection set, owned by the hub control loop.
#[derive(Default)]
pub struct Dispatcher {
    live: HashMap<ConnectionId, Member>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the live set.
    ///
    /// Callers register each connection once. A second registration under the
    /// same ID replaces the first, closing the old buffer.
    pub fn register(&mut self, id: ConnectionId, member: Member) {
        if self.live.insert(id.clone(), member).is_some() {
            warn!(conn_id = %id, "connection registered twice, replacing");
        }
        debug!(conn_id = %id, connections = self.live.len(), "registered");
        self.record_active();
    }

    /// Remove a connection and close its outbound buffer.
    ///
    /// Returns `false` when the connection was not live.
    pub fn unregister(&mut self, id: &ConnectionId) -> bool {
        let removed = self.live.remove(id).is_some();
        if removed {
            debug!(conn_id = %id, connections = self.live.len(), "unregistered");
            self.record_active();
        }
        removed
    }

    /// Offer `event` to every live connection without waiting on any of them.
    ///
    /// A connection whose buffer is full (or already closed) is removed, its
    /// buffer is closed and its teardown signal fires. It does not receive
    /// this event.
    pub fn broadcast(&mut self, event: &Arc<Event>) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        self.live.retain(|id, member| match member.try_deliver(event) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(conn_id = %id, event_name = event.name(), "outbound buffer full, disconnecting");
                member.tear_down();
                report.dropped.push(id.clone());
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(conn_id = %id, "outbound buffer already closed, removing");
                member.tear_down();
                report.dropped.push(id.clone());
                false
            }
        });

        counter!(WS_EVENTS_BROADCAST_TOTAL).increment(1);
        if !report.dropped.is_empty() {
            counter!(WS_BROADCAST_DROPS_TOTAL).increment(report.dropped.len() as u64);
            self.record_active();
        }
        debug!(
            event_name = event.name(),
            recipients = report.delivered,
            dropped = report.dropped.len(),
            "broadcast event"
        );
        report
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no connections are live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.live.contains_key(id)
    }

    pub(crate) fn apply(&mut self, command: Command) {
        match command {
            Command::Register { id, member } => self.register(id, member),
            Command::Unregister { id } => {
                let _ = self.unregister(&id);
            }
            Command::Broadcast { event } => {
                let _ = self.broadcast(&event);
            }
            Command::Count { reply } => {
                let _ = reply.send(self.live.len());
            }
            Command::Contains { id, reply } => {
                let _ = reply.send(self.contains(&id));
            }
        }
    }

    /// Process commands until every [`Hub`](super::Hub) handle is dropped.
    pub(crate) async fn run(mut self, mut intake: mpsc::Receiver<Command>) {
        info!("hub control loop started");
        while let Some(command) = intake.recv().await {
            self.apply(command);
        }
        info!(connections = self.live.len(), "hub control loop stopped");
    }

    fn record_active(&self) {
        gauge!(WS_CONNECTIONS_ACTIVE).set(self.live.len() as f64);
    }
}
