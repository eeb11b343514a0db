//! Crossbeam channel sink for consumers running on their own threads.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::core::error::EventError;
use crate::core::events::{DomainEvent, EventSink};

/// Sink that forwards events over a bounded channel without blocking.
#[derive(Clone)]
pub struct ChannelEventSink {
    tx: Sender<DomainEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver its consumer reads from.
    pub fn bounded(capacity: usize) -> (Self, Receiver<DomainEvent>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EventError::Full),
            Err(TrySendError::Disconnected(_)) => Err(EventError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ids::OfferingId;

    fn event() -> DomainEvent {
        DomainEvent::CapacityOverflowDetected {
            offering: OfferingId(1),
            occupancy: 1,
            capacity: 1,
        }
    }

    #[test]
    fn test_full_channel_reports_full() {
        let (sink, rx) = ChannelEventSink::bounded(1);
        sink.publish(event()).unwrap();
        assert!(matches!(sink.publish(event()), Err(EventError::Full)));
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_dropped_receiver_reports_disconnected() {
        let (sink, rx) = ChannelEventSink::bounded(4);
        drop(rx);
        assert!(matches!(sink.publish(event()), Err(EventError::Disconnected)));
    }
}
