//! Error and outcome types for admission operations.
//!
//! Expected rejections (`CapacityExceeded`, `AlreadyEnrolled`, ...) are values
//! carried in [`Decision`]. Only faults and usage errors are `Err`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::enrollment::EnrollmentStatus;
use crate::util::ids::{EnrollmentId, OfferingId};

/// Recoverable, expected refusal of an admission-control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// A row for (student, offering) already exists, in any status.
    AlreadyEnrolled,
    /// The student already holds a waitlist entry for the offering.
    AlreadyWaitlisted,
    /// Occupancy has reached effective capacity.
    CapacityExceeded,
    /// No matching row exists.
    NotFound,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AlreadyEnrolled => "already enrolled",
            Self::AlreadyWaitlisted => "already waitlisted",
            Self::CapacityExceeded => "capacity exceeded",
            Self::NotFound => "not found",
        };
        f.write_str(s)
    }
}

/// Result of an operation that may be refused without a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Decision<T> {
    /// The request took effect.
    Accepted(T),
    /// The request was refused; nothing was written.
    Rejected(Rejection),
}

impl<T> Decision<T> {
    /// True if the request took effect.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The rejection reason, if any.
    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(r) => Some(*r),
        }
    }

    /// Consume into the accepted value, if any.
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(v) => Some(v),
            Self::Rejected(_) => None,
        }
    }

    /// Map the accepted value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decision<U> {
        match self {
            Self::Accepted(v) => Decision::Accepted(f(v)),
            Self::Rejected(r) => Decision::Rejected(r),
        }
    }
}

/// Storage-layer failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lock wait exceeded the configured timeout, or the store picked this
    /// transaction as a deadlock victim.
    #[error("lock timeout on {0}")]
    LockTimeout(OfferingId),
    /// Offering is not registered with the store.
    #[error("unknown offering {0}")]
    UnknownOffering(OfferingId),
    /// Offering is already registered.
    #[error("offering {0} already exists")]
    OfferingExists(OfferingId),
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Faults and usage errors produced by admission components.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Caller requested a status change the state machine does not allow.
    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition {
        /// Current status.
        from: EnrollmentStatus,
        /// Requested status.
        to: EnrollmentStatus,
    },
    /// Offering is not registered.
    #[error("unknown offering {0}")]
    UnknownOffering(OfferingId),
    /// Offering is already registered.
    #[error("offering {0} already exists")]
    OfferingExists(OfferingId),
    /// No enrollment row with this id exists for the offering.
    #[error("unknown enrollment {0}")]
    UnknownEnrollment(EnrollmentId),
    /// Lock timeout or deadlock victim. Retryable by the caller with backoff.
    #[error("transient storage failure: {0}")]
    TransientStorageFailure(String),
    /// Roster provider failure.
    #[error("roster error: {0}")]
    Roster(String),
    /// Storage unavailable or corrupted.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AdmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockTimeout(id) => {
                Self::TransientStorageFailure(format!("lock timeout on {id}"))
            }
            StoreError::UnknownOffering(id) => Self::UnknownOffering(id),
            StoreError::OfferingExists(id) => Self::OfferingExists(id),
            StoreError::UniqueViolation(msg) | StoreError::Backend(msg) => Self::Backend(msg),
        }
    }
}

/// Event sink failures. Logged and dropped by publishers.
#[derive(Debug, Error)]
pub enum EventError {
    /// Sink buffer is full.
    #[error("event sink full")]
    Full,
    /// Receiving side has gone away.
    #[error("event sink disconnected")]
    Disconnected,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
