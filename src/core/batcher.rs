//! Idempotent bulk admission of a section roster at offering creation.
//!
//! The roster is walked in ascending student order so that, when it exceeds
//! capacity, the admitted subset is reproducible. The whole batch is one
//! transaction; students left unseated are reported, not treated as failure.

use std::collections::BTreeSet;
use std::num::NonZeroU32;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::capacity::{effective_capacity, has_room};
use crate::core::enrollment::{Enrollment, EnrollmentStatus};
use crate::core::error::AdmissionError;
use crate::core::events::{publish_best_effort, AutoEnrollPartial, DomainEvent, EventSink};
use crate::core::ledger::EnrollmentLedger;
use crate::core::model::{AutoEnrollStrategy, CourseOffering};
use crate::core::roster::RosterProvider;
use crate::core::store::{EnrollmentStore, OfferingTx};
use crate::util::clock::now_ms;
use crate::util::ids::{OfferingId, StudentId};

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Offering populated.
    pub offering: OfferingId,
    /// Capacity in force for the batch.
    pub capacity: u32,
    /// Students seated by this run, ascending.
    pub admitted: Vec<StudentId>,
    /// Roster members that already had a row and were skipped.
    pub already_enrolled: Vec<StudentId>,
    /// Roster members left unseated for lack of capacity.
    pub partial: Vec<AutoEnrollPartial>,
}

impl BatchReport {
    fn skipped(offering: OfferingId, capacity: NonZeroU32) -> Self {
        Self {
            offering,
            capacity: capacity.get(),
            admitted: Vec::new(),
            already_enrolled: Vec::new(),
            partial: Vec::new(),
        }
    }

    /// True if every roster member holds a row after the batch.
    pub fn is_complete(&self) -> bool {
        self.partial.is_empty()
    }
}

/// Runs roster auto-enrollment through the shared ledger's store.
pub struct AutoEnrollmentBatcher<S, K: ?Sized, R: ?Sized> {
    ledger: EnrollmentLedger<S, K>,
    roster: Arc<R>,
}

impl<S, K, R> AutoEnrollmentBatcher<S, K, R>
where
    S: EnrollmentStore,
    K: EventSink + ?Sized,
    R: RosterProvider + ?Sized,
{
    /// Create a batcher.
    pub const fn new(ledger: EnrollmentLedger<S, K>, roster: Arc<R>) -> Self {
        Self { ledger, roster }
    }

    /// Populate a freshly created offering according to its strategy.
    ///
    /// The roster is fetched before the offering lock is taken. Running this
    /// twice leaves the same enrollment set as running it once. With the
    /// `tokio-runtime` feature the locked batch runs on tokio's blocking pool,
    /// so a contended offering lock never stalls the executor; the future must
    /// then be awaited inside a tokio runtime.
    pub async fn on_offering_created(
        &self,
        offering: &CourseOffering,
    ) -> Result<BatchReport, AdmissionError>
    where
        S: 'static,
        K: 'static,
    {
        if offering.strategy != AutoEnrollStrategy::Section {
            return Ok(BatchReport::skipped(offering.id, effective_capacity(offering)));
        }
        let roster = self.roster.members_of(offering.section.id).await?;
        tracing::debug!(offering = %offering.id, section = %offering.section.id, members = roster.len(), "roster fetched");
        self.run_locked(offering.id, roster).await
    }

    #[cfg(feature = "tokio-runtime")]
    async fn run_locked(
        &self,
        offering: OfferingId,
        roster: BTreeSet<StudentId>,
    ) -> Result<BatchReport, AdmissionError>
    where
        S: 'static,
        K: 'static,
    {
        let ledger = self.ledger.clone();
        tokio::task::spawn_blocking(move || enroll_locked(&ledger, offering, roster))
            .await
            .map_err(|e| AdmissionError::Backend(format!("auto-enrollment task failed: {e}")))?
    }

    #[cfg(not(feature = "tokio-runtime"))]
    async fn run_locked(
        &self,
        offering: OfferingId,
        roster: BTreeSet<StudentId>,
    ) -> Result<BatchReport, AdmissionError> {
        enroll_locked(&self.ledger, offering, roster)
    }

    /// Admit a roster snapshot in ascending student order, up to capacity.
    ///
    /// Blocks on the offering lock; async callers go through
    /// [`Self::on_offering_created`].
    pub fn enroll_roster(
        &self,
        offering: OfferingId,
        roster: impl IntoIterator<Item = StudentId>,
    ) -> Result<BatchReport, AdmissionError> {
        enroll_locked(&self.ledger, offering, roster)
    }
}

fn enroll_locked<S, K>(
    ledger: &EnrollmentLedger<S, K>,
    offering: OfferingId,
    roster: impl IntoIterator<Item = StudentId>,
) -> Result<BatchReport, AdmissionError>
where
    S: EnrollmentStore,
    K: EventSink + ?Sized,
{
    let mut ordered: Vec<StudentId> = roster.into_iter().collect();
    ordered.sort_unstable();
    ordered.dedup();
    let now = now_ms();

    let mut tx = ledger.store().begin(offering)?;
    let capacity = effective_capacity(tx.offering());
    let occupancy = tx.occupancy();

    let mut report = BatchReport::skipped(offering, capacity);
    let mut staged = Vec::new();
    let mut staged_count: u32 = 0;
    for student in ordered {
        if tx.enrollment(student).is_some() {
            report.already_enrolled.push(student);
        } else if has_room(occupancy.saturating_add(staged_count), capacity) {
            staged.push(Enrollment::new(student, offering, EnrollmentStatus::Active, now));
            staged_count += 1;
        } else {
            report.partial.push(AutoEnrollPartial {
                offering,
                student,
                capacity: capacity.get(),
            });
        }
    }

    tx.insert_enrollments_ignoring_conflicts(staged.clone())?;
    // Only rows this batch actually wrote count as admitted.
    let admitted: Vec<Enrollment> = staged
        .into_iter()
        .filter(|e| tx.enrollment(e.student).is_some_and(|row| row.id == e.id))
        .collect();
    for enrollment in &admitted {
        tx.remove_waitlist(enrollment.student);
    }
    tx.commit()?;

    report.admitted = admitted.iter().map(|e| e.student).collect();
    tracing::info!(
        %offering,
        capacity = capacity.get(),
        admitted = report.admitted.len(),
        already_enrolled = report.already_enrolled.len(),
        skipped = report.partial.len(),
        "auto-enrollment batch committed"
    );
    if !report.partial.is_empty() {
        tracing::warn!(%offering, skipped = report.partial.len(), "auto-enrollment left students unseated");
    }

    for enrollment in &admitted {
        ledger.publish_created(enrollment);
    }
    for partial in &report.partial {
        publish_best_effort(&**ledger.sink(), DomainEvent::AutoEnrollPartial(partial.clone()));
    }
    Ok(report)
}
