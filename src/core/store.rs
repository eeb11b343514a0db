//! Storage abstractions for the enrollment and waitlist tables.
//!
//! A transaction is scoped to one offering and holds that offering's exclusive
//! lock from [`EnrollmentStore::begin`] until it is committed or dropped.
//! Admission, waitlist and batch paths all take this one lock, so no code path
//! ever holds two offering locks and lock ordering never comes up.

use crate::core::enrollment::Enrollment;
use crate::core::error::StoreError;
use crate::core::model::{CourseOffering, WaitlistEntry};
use crate::util::ids::{OfferingId, StudentId};

/// Outcome of inserting against the (student, offering) unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row written.
    Inserted,
    /// A row for the same key already exists; nothing written.
    Conflict,
}

/// Work staged under one offering's lock. Dropping without [`OfferingTx::commit`]
/// rolls back every staged write.
pub trait OfferingTx {
    /// Offering as of this transaction's snapshot.
    fn offering(&self) -> &CourseOffering;

    /// Occupying (`pending` or `active`) rows, including staged ones.
    fn occupancy(&self) -> u32;

    /// Row for `student`, in any status.
    fn enrollment(&self, student: StudentId) -> Option<&Enrollment>;

    /// Every row for the offering, ordered by student.
    fn enrollments(&self) -> Vec<Enrollment>;

    /// Insert one row, honoring the permanent (student, offering) constraint.
    fn insert_enrollment(&mut self, enrollment: Enrollment) -> Result<InsertOutcome, StoreError>;

    /// Insert many rows, skipping conflicts. Returns the number written.
    fn insert_enrollments_ignoring_conflicts(
        &mut self,
        enrollments: Vec<Enrollment>,
    ) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for enrollment in enrollments {
            if self.insert_enrollment(enrollment)? == InsertOutcome::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Replace an existing row, matched on student.
    fn update_enrollment(&mut self, enrollment: Enrollment) -> Result<(), StoreError>;

    /// Change the explicit capacity override.
    fn set_capacity_override(&mut self, capacity: Option<u32>);

    /// Waitlist entry for `student`.
    fn waitlist_entry(&self, student: StudentId) -> Option<&WaitlistEntry>;

    /// Entry with the lowest position.
    fn waitlist_head(&self) -> Option<&WaitlistEntry>;

    /// Highest position ever handed out that is still present.
    fn max_position(&self) -> Option<u32>;

    /// All entries in ascending position order.
    fn waitlist(&self) -> Vec<WaitlistEntry>;

    /// Insert an entry, honoring both waitlist unique constraints.
    fn insert_waitlist(&mut self, entry: WaitlistEntry) -> Result<InsertOutcome, StoreError>;

    /// Remove the entry for `student`, returning it if present.
    fn remove_waitlist(&mut self, student: StudentId) -> Option<WaitlistEntry>;

    /// Make every staged write durable and release the lock.
    fn commit(self) -> Result<(), StoreError>;
}

/// Transactional store with row-level exclusive locking per offering.
pub trait EnrollmentStore: Send + Sync {
    /// Transaction type handed out by [`EnrollmentStore::begin`].
    type Tx<'a>: OfferingTx
    where
        Self: 'a;

    /// Register a new offering.
    fn create_offering(&self, offering: CourseOffering) -> Result<(), StoreError>;

    /// Acquire `offering`'s exclusive lock and open a transaction.
    ///
    /// Fails with [`StoreError::LockTimeout`] if the lock is not granted in time;
    /// nothing is written in that case.
    fn begin(&self, offering: OfferingId) -> Result<Self::Tx<'_>, StoreError>;
}
