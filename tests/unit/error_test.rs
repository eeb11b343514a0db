//! Tests for error types

use enrollment_admission::core::{AdmissionError, EnrollmentStatus, Rejection, StoreError};
use enrollment_admission::util::OfferingId;

#[test]
fn test_invalid_transition_error() {
    let err = AdmissionError::InvalidStateTransition {
        from: EnrollmentStatus::Completed,
        to: EnrollmentStatus::Dropped,
    };
    assert_eq!(format!("{}", err), "invalid state transition: Completed -> Dropped");
}

#[test]
fn test_unknown_offering_error() {
    let err: AdmissionError = StoreError::UnknownOffering(OfferingId(3)).into();
    assert_eq!(format!("{}", err), "unknown offering offering-3");
}

#[test]
fn test_backend_error() {
    let err: AdmissionError = StoreError::Backend("connection failed".to_string()).into();
    assert_eq!(format!("{}", err), "backend error: connection failed");
}

#[test]
fn test_unique_violation_is_backend_fault() {
    let err: AdmissionError = StoreError::UniqueViolation("position 1".into()).into();
    assert!(matches!(err, AdmissionError::Backend(_)));
}

#[test]
fn test_rejection_display() {
    assert_eq!(Rejection::CapacityExceeded.to_string(), "capacity exceeded");
    assert_eq!(Rejection::AlreadyWaitlisted.to_string(), "already waitlisted");
}
