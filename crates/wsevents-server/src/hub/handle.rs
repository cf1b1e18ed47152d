//! Cloneable handle to the hub control loop.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use wsevents_core::{ConnectionId, Event};

use super::command::Command;
use super::dispatcher::Dispatcher;
use super::member::Member;
use crate::errors::HubError;

/// Default intake capacity shared by all request kinds.
pub const DEFAULT_INTAKE_CAPACITY: usize = 1024;

/// Handle for submitting requests to the hub.
///
/// Every method awaits only for room on the intake; the control loop applies
/// requests in the order they arrive.
#[derive(Clone, Debug)]
pub struct Hub {
    intake: mpsc::Sender<Command>,
}

impl Hub {
    /// Spawn the control loop on the current Tokio runtime.
    ///
    /// The loop runs until every clone of the returned handle is dropped.
    pub fn spawn(intake_capacity: usize) -> (Self, JoinHandle<()>) {
        let (intake, rx) = mpsc::channel(intake_capacity.max(1));
        let task = tokio::spawn(Dispatcher::new().run(rx));
        (Self { intake }, task)
    }

    /// Add a connection to the live set. Call once per connection.
    pub async fn register(&self, id: ConnectionId, member: Member) -> Result<(), HubError> {
        self.submit(Command::Register { id, member }).await
    }

    /// Remove a connection and close its outbound buffer. Idempotent.
    pub async fn unregister(&self, id: &ConnectionId) -> Result<(), HubError> {
        self.submit(Command::Unregister { id: id.clone() }).await
    }

    /// Fan `event` out to every live connection.
    pub async fn broadcast(&self, event: Event) -> Result<(), HubError> {
        self.submit(Command::Broadcast {
            event: Arc::new(event),
        })
        .await
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> Result<usize, HubError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Count { reply }).await?;
        rx.await.map_err(|_| HubError::Stopped)
    }

    /// Whether `id` is currently live.
    pub async fn contains(&self, id: &ConnectionId) -> Result<bool, HubError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Contains {
            id: id.clone(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| HubError::Stopped)
    }

    async fn submit(&self, command: Command) -> Result<(), HubError> {
        self.intake.send(command).await.map_err(|_| HubError::Stopped)
    }
}
