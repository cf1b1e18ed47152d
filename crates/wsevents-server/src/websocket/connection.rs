//! One client session: registration, the two pumps, and teardown.
//!
//! The inbound pump runs on the connection's own task and the outbound pump
//! on a spawned task. Whichever stops first fires the shared teardown token,
//! which stops the other. The connection task then unregisters once, takes
//! the send half back from the outbound pump, and closes the transport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, instrument, warn};
use wsevents_core::{ConnectionId, Event};

use super::transport::{MessageSink, MessageStream};
use crate::handlers::HandlerRegistry;
use crate::hub::{Hub, Member, OutboundReceiver};
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_TOTAL, WS_DECODE_ERRORS_TOTAL,
    WS_DISCONNECTIONS_TOTAL, WS_EVENTS_RECEIVED_TOTAL,
};

/// Default outbound buffer capacity per connection.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// How long closing the transport may take before the halves are dropped.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The peer closed the transport cleanly.
    TransportClosed,
    /// Receiving from or sending to the transport failed.
    TransportFailed,
    /// An inbound message was not a valid event.
    DecodeFailed,
    /// An outbound event could not be serialized.
    SerializeFailed,
    /// The hub closed the outbound buffer.
    BufferClosed,
    /// The teardown signal fired (other pump stopped, or the hub dropped us).
    TornDown,
    /// The hub control loop is gone.
    HubStopped,
    /// The outbound pump task was aborted or panicked.
    Aborted,
}

/// How both pumps of a finished connection stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Teardown {
    /// Exit reason of the inbound pump.
    pub inbound: PumpExit,
    /// Exit reason of the outbound pump.
    pub outbound: PumpExit,
}

/// A client session bridging one transport to the hub.
pub struct Connection {
    id: ConnectionId,
    hub: Hub,
    handlers: Arc<HandlerRegistry>,
    outbound_capacity: usize,
}

impl Connection {
    /// Create a connection with a fresh ID. Nothing happens until [`run`](Self::run).
    pub fn new(hub: Hub, handlers: Arc<HandlerRegistry>, outbound_capacity: usize) -> Self {
        Self {
            id: ConnectionId::new(),
            hub,
            handlers,
            outbound_capacity,
        }
    }

    /// Connection ID.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Register with the hub and pump messages until the session ends.
    ///
    /// The transport is closed exactly once, after both pumps have stopped.
    #[instrument(skip_all, fields(conn_id = %self.id))]
    pub async fn run<R, W>(self, mut stream: R, mut sink: W) -> Teardown
    where
        R: MessageStream,
        W: MessageSink,
    {
        let teardown = CancellationToken::new();
        let (member, outbound) = Member::channel(self.outbound_capacity, teardown.clone());

        if self.hub.register(self.id.clone(), member).await.is_err() {
            warn!("hub stopped, refusing connection");
            close_transport(&mut sink).await;
            return Teardown {
                inbound: PumpExit::HubStopped,
                outbound: PumpExit::HubStopped,
            };
        }

        let started = Instant::now();
        info!("client connected");
        counter!(WS_CONNECTIONS_TOTAL).increment(1);

        let writer = tokio::spawn(
            outbound_pump(outbound, sink, teardown.clone()).instrument(tracing::Span::current()),
        );

        let inbound = inbound_pump(&mut stream, &self.hub, &self.handlers, &teardown).await;
        teardown.cancel();
        let _ = self.hub.unregister(&self.id).await;

        let outbound = match writer.await {
            Ok((mut sink, exit)) => {
                close_transport(&mut sink).await;
                exit
            }
            Err(e) => {
                warn!(error = %e, "outbound pump did not finish");
                PumpExit::Aborted
            }
        };

        info!(?inbound, ?outbound, "client disconnected");
        counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
        histogram!(WS_CONNECTION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        Teardown { inbound, outbound }
    }
}

/// Close the send half, giving up after [`CLOSE_TIMEOUT`].
///
/// A peer that stopped reading can keep the close frame from flushing.
async fn close_transport<W: MessageSink>(sink: &mut W) {
    match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "transport close failed"),
        Err(_) => debug!(timeout = ?CLOSE_TIMEOUT, "transport close timed out, dropping"),
    }
}

/// Decode inbound messages and submit them to the hub.
async fn inbound_pump<R: MessageStream>(
    stream: &mut R,
    hub: &Hub,
    handlers: &HandlerRegistry,
    teardown: &CancellationToken,
) -> PumpExit {
    loop {
        let received = tokio::select! {
            () = teardown.cancelled() => return PumpExit::TornDown,
            received = stream.receive() => received,
        };

        let raw = match received {
            Ok(Some(raw)) => raw,
            Ok(None) => return PumpExit::TransportClosed,
            Err(e) => {
                debug!(error = %e, "receive failed");
                return PumpExit::TransportFailed;
            }
        };

        let event = match Event::decode(&raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "closing connection on malformed event");
                counter!(WS_DECODE_ERRORS_TOTAL).increment(1);
                return PumpExit::DecodeFailed;
            }
        };
        counter!(WS_EVENTS_RECEIVED_TOTAL).increment(1);
        debug!(event_name = event.name(), "event received");

        let Some(event) = handlers.apply(event) else {
            debug!("event suppressed by handler");
            continue;
        };

        let submitted = tokio::select! {
            () = teardown.cancelled() => return PumpExit::TornDown,
            submitted = hub.broadcast(event) => submitted,
        };
        if submitted.is_err() {
            return PumpExit::HubStopped;
        }
    }
}

/// Serialize buffered events to the transport in FIFO order.
///
/// Hands the send half back so the connection can close it.
async fn outbound_pump<W: MessageSink>(
    mut outbound: OutboundReceiver,
    mut sink: W,
    teardown: CancellationToken,
) -> (W, PumpExit) {
    let exit = loop {
        let event = tokio::select! {
            biased;
            () = teardown.cancelled() => break PumpExit::TornDown,
            next = outbound.recv() => match next {
                Some(event) => event,
                None => break PumpExit::BufferClosed,
            },
        };

        let text = match event.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, event_name = event.name(), "failed to serialize event");
                break PumpExit::SerializeFailed;
            }
        };

        tokio::select! {
            biased;
            () = teardown.cancelled() => break PumpExit::TornDown,
            sent = sink.send(text) => {
                if let Err(e) = sent {
                    debug!(error = %e, "send failed");
                    break PumpExit::TransportFailed;
                }
            }
        }
    };
    teardown.cancel();
    (sink, exit)
}
