//! Handle to a running server: signal it to stop and wait for the accept
//! loop to drain.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Owns the serve task started by [`WseventsServer::listen`](crate::server::WseventsServer::listen).
///
/// Dropping the handle leaves the server running.
#[derive(Debug)]
pub struct ServeHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ServeHandle {
    pub(crate) fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { token, task }
    }

    /// Stop accepting connections without waiting.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop accepting connections and wait up to `timeout` for the serve task.
    ///
    /// Returns `false` if the task had to be aborted.
    pub async fn shutdown_and_wait(mut self, timeout: Duration) -> bool {
        self.shutdown();
        info!(timeout_secs = timeout.as_secs(), "stopping server");

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "serve task did not finish cleanly");
                true
            }
            Err(_) => {
                warn!("server still running after {timeout:?}, aborting");
                self.task.abort();
                false
            }
        }
    }
}
