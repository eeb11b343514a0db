//! Domain events and the outbound sink abstraction.
//!
//! Events are published strictly after the transaction that produced them has
//! committed. Delivery is at-most-once; a failed publish never undoes an admission.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::error::EventError;
use crate::util::ids::{EnrollmentId, OfferingId, StudentId};

/// Per-student diagnostic for a roster member the batcher could not seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoEnrollPartial {
    /// Offering being populated.
    pub offering: OfferingId,
    /// Student left unseated.
    pub student: StudentId,
    /// Capacity in force for the batch.
    pub capacity: u32,
}

/// Outbound notifications consumed by logging, metrics and notification layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// An occupying enrollment was committed.
    EnrollmentCreated {
        /// New row.
        enrollment: EnrollmentId,
        /// Seated student.
        student: StudentId,
        /// Offering.
        offering: OfferingId,
        /// Commit time.
        at_ms: u128,
    },
    /// A seat was freed.
    EnrollmentDropped {
        /// Dropped row.
        enrollment: EnrollmentId,
        /// Student who left.
        student: StudentId,
        /// Offering with a freed seat.
        offering: OfferingId,
        /// Caller-supplied reason.
        reason: Option<String>,
        /// Commit time.
        at_ms: u128,
    },
    /// An admission found the offering full, or fuller than its capacity.
    CapacityOverflowDetected {
        /// Offering.
        offering: OfferingId,
        /// Occupying rows observed.
        occupancy: u32,
        /// Effective capacity observed.
        capacity: u32,
    },
    /// The batcher skipped a roster member for lack of capacity.
    AutoEnrollPartial(AutoEnrollPartial),
}

impl DomainEvent {
    /// Offering the event concerns.
    pub const fn offering(&self) -> OfferingId {
        match self {
            Self::EnrollmentCreated { offering, .. }
            | Self::EnrollmentDropped { offering, .. }
            | Self::CapacityOverflowDetected { offering, .. } => *offering,
            Self::AutoEnrollPartial(p) => p.offering,
        }
    }

    /// Short action name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EnrollmentCreated { .. } => "enrollment_created",
            Self::EnrollmentDropped { .. } => "enrollment_dropped",
            Self::CapacityOverflowDetected { .. } => "capacity_overflow_detected",
            Self::AutoEnrollPartial(_) => "auto_enroll_partial",
        }
    }
}

/// Fire-and-forget event sink.
pub trait EventSink: Send + Sync {
    /// Publish one event. Must not block on the consumer.
    fn publish(&self, event: DomainEvent) -> Result<(), EventError>;
}

/// Publish and log on failure. Used by every component after commit.
pub(crate) fn publish_best_effort<K: EventSink + ?Sized>(sink: &K, event: DomainEvent) {
    let kind = event.kind();
    let offering = event.offering();
    if let Err(e) = sink.publish(event) {
        tracing::warn!(%offering, kind, error = %e, "dropping domain event");
    }
}

/// In-memory event sink for testing and dev. Oldest events are evicted once
/// the buffer is full.
pub struct InMemoryEventSink {
    events: Mutex<VecDeque<DomainEvent>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Remove and return all stored events.
    pub fn drain(&self) -> Vec<DomainEvent> {
        self.events.lock().drain(..).collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }
}

impl<K: EventSink + ?Sized> EventSink for std::sync::Arc<K> {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        (**self).publish(event)
    }
}
