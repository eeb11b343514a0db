//! Tokio mpsc sink feeding async consumers such as the promotion worker.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::core::error::EventError;
use crate::core::events::{DomainEvent, EventSink};

/// Sink over an unbounded tokio channel. `send` never blocks.
#[derive(Clone)]
pub struct TokioEventSink {
    tx: UnboundedSender<DomainEvent>,
}

impl TokioEventSink {
    /// Create a sink and its receiver.
    pub fn unbounded() -> (Self, UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for TokioEventSink {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        self.tx.send(event).map_err(|_| EventError::Disconnected)
    }
}
