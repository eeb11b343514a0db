//! Enrollment rows and their status state machine.

use serde::{Deserialize, Serialize};

use crate::core::error::AdmissionError;
use crate::util::ids::{EnrollmentId, OfferingId, StudentId};

/// Status of an enrollment in its lifecycle.
///
/// Legal edges: `Pending -> Active`, `Pending -> Dropped`, `Active -> Dropped`,
/// `Active -> Completed`, `Active -> Failed`. Nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Seat reserved, awaiting confirmation. Counts toward capacity.
    Pending,
    /// Seat occupied. Counts toward capacity.
    Active,
    /// Student left the offering.
    Dropped,
    /// Finished and passed.
    Completed,
    /// Finished and did not pass.
    Failed,
}

impl EnrollmentStatus {
    /// States that count toward occupancy.
    pub const fn is_occupying(self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    /// States with no outgoing edges.
    pub const fn is_terminal(self) -> bool {
        !self.is_occupying()
    }

    /// Whether `self -> next` is an edge of the state machine.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active | Self::Dropped)
                | (Self::Active, Self::Dropped | Self::Completed | Self::Failed)
        )
    }
}

/// A (student, offering) seat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Row identifier.
    pub id: EnrollmentId,
    /// Seated student.
    pub student: StudentId,
    /// Offering the seat belongs to.
    pub offering: OfferingId,
    /// Current status.
    pub status: EnrollmentStatus,
    /// Set when the row is created.
    pub enrolled_at_ms: u128,
    /// Set by the drop transition.
    pub dropped_at_ms: Option<u128>,
    /// Set by the complete transition (passed or failed).
    pub completed_at_ms: Option<u128>,
    /// Caller-supplied reason recorded on drop.
    pub drop_reason: Option<String>,
}

impl Enrollment {
    /// New row in the given occupying status.
    pub fn new(
        student: StudentId,
        offering: OfferingId,
        status: EnrollmentStatus,
        now_ms: u128,
    ) -> Self {
        Self {
            id: EnrollmentId::new(),
            student,
            offering,
            status,
            enrolled_at_ms: now_ms,
            dropped_at_ms: None,
            completed_at_ms: None,
            drop_reason: None,
        }
    }

    /// Whether this row counts toward occupancy.
    pub const fn is_occupying(&self) -> bool {
        self.status.is_occupying()
    }

    fn transition(&mut self, next: EnrollmentStatus) -> Result<(), AdmissionError> {
        if !self.status.can_transition_to(next) {
            return Err(AdmissionError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// `Pending -> Active`.
    pub fn activate(&mut self) -> Result<(), AdmissionError> {
        self.transition(EnrollmentStatus::Active)
    }

    /// `Pending | Active -> Dropped`, stamping `dropped_at_ms`.
    pub fn drop_seat(&mut self, reason: Option<String>, now_ms: u128) -> Result<(), AdmissionError> {
        self.transition(EnrollmentStatus::Dropped)?;
        self.dropped_at_ms = Some(now_ms);
        self.drop_reason = reason;
        Ok(())
    }

    /// `Active -> Completed | Failed`, stamping `completed_at_ms`.
    pub fn complete(&mut self, passed: bool, now_ms: u128) -> Result<(), AdmissionError> {
        let next = if passed {
            EnrollmentStatus::Completed
        } else {
            EnrollmentStatus::Failed
        };
        self.transition(next)?;
        self.completed_at_ms = Some(now_ms);
        Ok(())
    }
}
