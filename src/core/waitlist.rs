//! Ordered overflow queue per offering.
//!
//! Positions are priority ranks handed out as `max(existing) + 1` under the same
//! offering lock as admission, so two joins can never receive the same position.
//! `leave` does not renumber; iteration is by ascending position.

use crate::core::enrollment::EnrollmentStatus;
use crate::core::error::{AdmissionError, Decision, Rejection};
use crate::core::events::EventSink;
use crate::core::ledger::{seat_within, EnrollmentLedger};
use crate::core::model::WaitlistEntry;
use crate::core::store::{EnrollmentStore, InsertOutcome, OfferingTx};
use crate::util::clock::now_ms;
use crate::util::ids::{OfferingId, StudentId, WaitlistEntryId};

/// Waitlist operations, admitting through the shared [`EnrollmentLedger`].
pub struct WaitlistQueue<S, K: ?Sized> {
    ledger: EnrollmentLedger<S, K>,
}

impl<S, K> WaitlistQueue<S, K>
where
    S: EnrollmentStore,
    K: EventSink + ?Sized,
{
    /// Create a queue over the ledger's store.
    pub const fn new(ledger: EnrollmentLedger<S, K>) -> Self {
        Self { ledger }
    }

    /// Queue `student` at the back of `offering`'s waitlist.
    ///
    /// Rejects with `AlreadyEnrolled` when any row exists for the pair. A
    /// dropped or finished student can never be admitted again, so queueing
    /// them would only hold a place nobody can use.
    pub fn join(
        &self,
        student: StudentId,
        offering: OfferingId,
    ) -> Result<Decision<WaitlistEntry>, AdmissionError> {
        let mut tx = self.ledger.store().begin(offering)?;
        if tx.waitlist_entry(student).is_some() {
            return Ok(Decision::Rejected(Rejection::AlreadyWaitlisted));
        }
        if tx.enrollment(student).is_some() {
            return Ok(Decision::Rejected(Rejection::AlreadyEnrolled));
        }
        let position = match tx.max_position() {
            None => 1,
            Some(max) => max.checked_add(1).ok_or_else(|| {
                AdmissionError::Backend(format!("waitlist positions exhausted for {offering}"))
            })?,
        };
        let entry = WaitlistEntry {
            id: WaitlistEntryId::new(),
            student,
            offering,
            position,
            added_at_ms: now_ms(),
        };
        if tx.insert_waitlist(entry.clone())? == InsertOutcome::Conflict {
            return Ok(Decision::Rejected(Rejection::AlreadyWaitlisted));
        }
        tx.commit()?;
        tracing::info!(%offering, %student, position, "joined waitlist");
        Ok(Decision::Accepted(entry))
    }

    /// Remove `student` from the waitlist. Remaining positions are unchanged.
    pub fn leave(
        &self,
        student: StudentId,
        offering: OfferingId,
    ) -> Result<Decision<WaitlistEntry>, AdmissionError> {
        let mut tx = self.ledger.store().begin(offering)?;
        let Some(entry) = tx.remove_waitlist(student) else {
            return Ok(Decision::Rejected(Rejection::NotFound));
        };
        tx.commit()?;
        tracing::info!(%offering, %student, position = entry.position, "left waitlist");
        Ok(Decision::Accepted(entry))
    }

    /// Admit the lowest-position student if a seat is free.
    ///
    /// Returns `None` when the queue is empty or the seat was taken by a
    /// concurrent direct admission; the head entry then stays put and the next
    /// position is not tried. Entries whose pair already has a row can never be
    /// admitted; they are removed and the next entry is taken instead.
    pub fn promote(&self, offering: OfferingId) -> Result<Option<StudentId>, AdmissionError> {
        let mut tx = self.ledger.store().begin(offering)?;
        let now = now_ms();
        while let Some(head) = tx.waitlist_head().cloned() {
            match seat_within(&mut tx, head.student, EnrollmentStatus::Active, now)? {
                Decision::Accepted(enrollment) => {
                    tx.commit()?;
                    tracing::info!(%offering, student = %head.student, position = head.position, "promoted from waitlist");
                    self.ledger.publish_created(&enrollment);
                    return Ok(Some(head.student));
                }
                Decision::Rejected(Rejection::AlreadyEnrolled) => {
                    tx.remove_waitlist(head.student);
                    tracing::warn!(%offering, student = %head.student, "removed unpromotable waitlist entry");
                }
                Decision::Rejected(rejection) => {
                    tx.commit()?;
                    tracing::debug!(%offering, student = %head.student, %rejection, "promotion deferred");
                    return Ok(None);
                }
            }
        }
        tx.commit()?;
        Ok(None)
    }

    /// Entries in ascending position order.
    pub fn entries(&self, offering: OfferingId) -> Result<Vec<WaitlistEntry>, AdmissionError> {
        Ok(self.ledger.store().begin(offering)?.waitlist())
    }

    /// Position held by `student`, if waitlisted.
    pub fn position_of(
        &self,
        student: StudentId,
        offering: OfferingId,
    ) -> Result<Option<u32>, AdmissionError> {
        Ok(self
            .ledger
            .store()
            .begin(offering)?
            .waitlist_entry(student)
            .map(|e| e.position))
    }

    /// Ledger used for admissions.
    pub const fn ledger(&self) -> &EnrollmentLedger<S, K> {
        &self.ledger
    }
}

impl<S, K: ?Sized> Clone for WaitlistQueue<S, K> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}
