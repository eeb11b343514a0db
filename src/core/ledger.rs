//! Authoritative enrollment record and the atomic admission protocol.
//!
//! Every admission runs as one transaction under the offering's exclusive lock:
//! lock, resolve capacity, count occupancy, insert, commit. Nothing else runs
//! while the lock is held. Domain events are published after the commit and a
//! failed publish never affects the committed row.

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::core::capacity::{effective_capacity, has_room};
use crate::core::enrollment::{Enrollment, EnrollmentStatus};
use crate::core::error::{AdmissionError, Decision, Rejection, StoreError};
use crate::core::events::{publish_best_effort, DomainEvent, EventSink};
use crate::core::store::{EnrollmentStore, InsertOutcome, OfferingTx};
use crate::util::clock::now_ms;
use crate::util::ids::{OfferingId, StudentId};

/// Enrollment ledger over a transactional store and an outbound event sink.
pub struct EnrollmentLedger<S, K: ?Sized> {
    store: Arc<S>,
    sink: Arc<K>,
}

impl<S, K: ?Sized> Clone for EnrollmentLedger<S, K> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S, K> EnrollmentLedger<S, K>
where
    S: EnrollmentStore,
    K: EventSink + ?Sized,
{
    /// Create a ledger from a shared store and sink.
    pub const fn new(store: Arc<S>, sink: Arc<K>) -> Self {
        Self { store, sink }
    }

    /// Shared store handle.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Shared sink handle.
    pub const fn sink(&self) -> &Arc<K> {
        &self.sink
    }

    /// Register a new offering with the store.
    pub fn register_offering(
        &self,
        offering: crate::core::model::CourseOffering,
    ) -> Result<(), AdmissionError> {
        let id = offering.id;
        self.store.create_offering(offering)?;
        tracing::info!(offering = %id, "offering registered");
        Ok(())
    }

    /// Admit `student` into `offering` as `active`, subject to capacity.
    ///
    /// Any existing row for the pair, including a dropped one, rejects with
    /// `AlreadyEnrolled`.
    pub fn admit(
        &self,
        student: StudentId,
        offering: OfferingId,
    ) -> Result<Decision<Enrollment>, AdmissionError> {
        self.seat(student, offering, EnrollmentStatus::Active)
    }

    /// Reserve a seat as `pending`. Same capacity rules as [`Self::admit`].
    pub fn hold(
        &self,
        student: StudentId,
        offering: OfferingId,
    ) -> Result<Decision<Enrollment>, AdmissionError> {
        self.seat(student, offering, EnrollmentStatus::Pending)
    }

    fn seat(
        &self,
        student: StudentId,
        offering: OfferingId,
        status: EnrollmentStatus,
    ) -> Result<Decision<Enrollment>, AdmissionError> {
        let mut tx = self.store.begin(offering)?;
        match seat_within(&mut tx, student, status, now_ms())? {
            Decision::Accepted(enrollment) => {
                tx.commit()?;
                tracing::info!(%offering, %student, status = ?enrollment.status, "admitted");
                self.publish_created(&enrollment);
                Ok(Decision::Accepted(enrollment))
            }
            Decision::Rejected(Rejection::CapacityExceeded) => {
                let occupancy = tx.occupancy();
                let capacity = effective_capacity(tx.offering());
                drop(tx);
                self.report_full(offering, occupancy, capacity);
                Ok(Decision::Rejected(Rejection::CapacityExceeded))
            }
            Decision::Rejected(rejection) => {
                tracing::debug!(%offering, %student, %rejection, "admission rejected");
                Ok(Decision::Rejected(rejection))
            }
        }
    }

    /// `pending -> active`.
    pub fn activate(&self, enrollment: &Enrollment) -> Result<Enrollment, AdmissionError> {
        self.transition(enrollment, |row| row.activate())
    }

    /// `pending | active -> dropped`, stamping `dropped_at`.
    pub fn drop(
        &self,
        enrollment: &Enrollment,
        reason: Option<String>,
    ) -> Result<Enrollment, AdmissionError> {
        let now = now_ms();
        let dropped = self.transition(enrollment, |row| row.drop_seat(reason, now))?;
        tracing::info!(offering = %dropped.offering, student = %dropped.student, "enrollment dropped");
        publish_best_effort(
            &*self.sink,
            DomainEvent::EnrollmentDropped {
                enrollment: dropped.id,
                student: dropped.student,
                offering: dropped.offering,
                reason: dropped.drop_reason.clone(),
                at_ms: now,
            },
        );
        Ok(dropped)
    }

    /// `active -> completed` when `passed`, else `active -> failed`.
    pub fn complete(&self, enrollment: &Enrollment, passed: bool) -> Result<Enrollment, AdmissionError> {
        let now = now_ms();
        self.transition(enrollment, |row| row.complete(passed, now))
    }

    /// Apply a status change to the committed row, never to the caller's copy.
    fn transition(
        &self,
        enrollment: &Enrollment,
        apply: impl FnOnce(&mut Enrollment) -> Result<(), AdmissionError>,
    ) -> Result<Enrollment, AdmissionError> {
        let mut tx = self.store.begin(enrollment.offering)?;
        let mut row = tx
            .enrollment(enrollment.student)
            .filter(|row| row.id == enrollment.id)
            .cloned()
            .ok_or(AdmissionError::UnknownEnrollment(enrollment.id))?;
        apply(&mut row)?;
        tx.update_enrollment(row.clone())?;
        tx.commit()?;
        Ok(row)
    }

    /// Change the offering's capacity override. Lowering capacity below current
    /// occupancy evicts nobody; further admissions are rejected until it drains.
    pub fn set_capacity_override(
        &self,
        offering: OfferingId,
        capacity: Option<u32>,
    ) -> Result<NonZeroU32, AdmissionError> {
        let mut tx = self.store.begin(offering)?;
        tx.set_capacity_override(capacity);
        let effective = effective_capacity(tx.offering());
        let occupancy = tx.occupancy();
        tx.commit()?;
        tracing::info!(%offering, capacity = effective.get(), occupancy, "capacity changed");
        if occupancy > effective.get() {
            self.report_full(offering, occupancy, effective);
        }
        Ok(effective)
    }

    /// Committed occupancy.
    pub fn occupancy(&self, offering: OfferingId) -> Result<u32, AdmissionError> {
        Ok(self.store.begin(offering)?.occupancy())
    }

    /// Committed effective capacity.
    pub fn capacity(&self, offering: OfferingId) -> Result<NonZeroU32, AdmissionError> {
        Ok(effective_capacity(self.store.begin(offering)?.offering()))
    }

    /// Committed row for the pair, in any status.
    pub fn enrollment(
        &self,
        student: StudentId,
        offering: OfferingId,
    ) -> Result<Option<Enrollment>, AdmissionError> {
        Ok(self.store.begin(offering)?.enrollment(student).cloned())
    }

    /// Every committed row for the offering, ordered by student.
    pub fn enrollments(&self, offering: OfferingId) -> Result<Vec<Enrollment>, AdmissionError> {
        Ok(self.store.begin(offering)?.enrollments())
    }

    pub(crate) fn publish_created(&self, enrollment: &Enrollment) {
        publish_best_effort(
            &*self.sink,
            DomainEvent::EnrollmentCreated {
                enrollment: enrollment.id,
                student: enrollment.student,
                offering: enrollment.offering,
                at_ms: enrollment.enrolled_at_ms,
            },
        );
    }

    pub(crate) fn report_full(&self, offering: OfferingId, occupancy: u32, capacity: NonZeroU32) {
        if occupancy > capacity.get() {
            tracing::warn!(%offering, occupancy, capacity = capacity.get(), "occupancy above capacity");
        } else {
            tracing::warn!(%offering, occupancy, capacity = capacity.get(), "offering full");
        }
        publish_best_effort(
            &*self.sink,
            DomainEvent::CapacityOverflowDetected {
                offering,
                occupancy,
                capacity: capacity.get(),
            },
        );
    }
}

/// Capacity check and insert for one student. The caller owns the lock and
/// decides whether to commit.
///
/// On success any waitlist entry the student holds is removed in the same
/// transaction, so a student never has both a seat and a queue entry.
pub(crate) fn seat_within<T: OfferingTx>(
    tx: &mut T,
    student: StudentId,
    status: EnrollmentStatus,
    now_ms: u128,
) -> Result<Decision<Enrollment>, StoreError> {
    if tx.enrollment(student).is_some() {
        return Ok(Decision::Rejected(Rejection::AlreadyEnrolled));
    }
    if !has_room(tx.occupancy(), effective_capacity(tx.offering())) {
        return Ok(Decision::Rejected(Rejection::CapacityExceeded));
    }
    let enrollment = Enrollment::new(student, tx.offering().id, status, now_ms);
    if tx.insert_enrollment(enrollment.clone())? == InsertOutcome::Conflict {
        return Ok(Decision::Rejected(Rejection::AlreadyEnrolled));
    }
    tx.remove_waitlist(student);
    Ok(Decision::Accepted(enrollment))
}
