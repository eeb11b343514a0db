//! In-memory transactional store.
//!
//! Each offering lives behind its own `parking_lot::Mutex`. A transaction owns
//! the lock through an `ArcMutexGuard` and writes the record in place, recording
//! an undo entry per write. `commit` clears the log; dropping the transaction
//! replays it in reverse, so a rollback costs only what the transaction wrote.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};

use crate::core::enrollment::Enrollment;
use crate::core::error::StoreError;
use crate::core::model::{CourseOffering, WaitlistEntry};
use crate::core::store::{EnrollmentStore, InsertOutcome, OfferingTx};
use crate::util::ids::{OfferingId, StudentId};

/// Default wait for an offering lock before surfacing a transient failure.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct OfferingRecord {
    offering: CourseOffering,
    enrollments: BTreeMap<StudentId, Enrollment>,
    /// Rows in `enrollments` that are pending or active.
    occupying: u32,
    /// position -> entry
    waitlist: BTreeMap<u32, WaitlistEntry>,
    /// student -> position
    waitlisted: HashMap<StudentId, u32>,
}

impl OfferingRecord {
    fn new(offering: CourseOffering) -> Self {
        Self {
            offering,
            enrollments: BTreeMap::new(),
            occupying: 0,
            waitlist: BTreeMap::new(),
            waitlisted: HashMap::new(),
        }
    }

    /// Store `enrollment`, keeping `occupying` in step. Returns the replaced row.
    fn put_enrollment(&mut self, enrollment: Enrollment) -> Option<Enrollment> {
        if enrollment.is_occupying() {
            self.occupying = self.occupying.saturating_add(1);
        }
        let previous = self.enrollments.insert(enrollment.student, enrollment);
        if previous.as_ref().is_some_and(Enrollment::is_occupying) {
            self.occupying = self.occupying.saturating_sub(1);
        }
        previous
    }

    fn take_enrollment(&mut self, student: StudentId) {
        if self
            .enrollments
            .remove(&student)
            .is_some_and(|row| row.is_occupying())
        {
            self.occupying = self.occupying.saturating_sub(1);
        }
    }

    fn put_waitlist(&mut self, entry: WaitlistEntry) {
        self.waitlisted.insert(entry.student, entry.position);
        self.waitlist.insert(entry.position, entry);
    }

    fn take_waitlist(&mut self, student: StudentId) -> Option<WaitlistEntry> {
        let position = self.waitlisted.remove(&student)?;
        self.waitlist.remove(&position)
    }

    fn undo(&mut self, step: Undo) {
        match step {
            Undo::Enrollment(_, Some(previous)) => {
                self.put_enrollment(previous);
            }
            Undo::Enrollment(student, None) => self.take_enrollment(student),
            Undo::CapacityOverride(capacity) => self.offering.capacity_override = capacity,
            Undo::WaitlistInserted(student) => {
                self.take_waitlist(student);
            }
            Undo::WaitlistRemoved(entry) => self.put_waitlist(entry),
        }
    }
}

/// Inverse of one write made through an [`InMemoryTx`].
#[derive(Debug)]
enum Undo {
    /// Restore the row for the student, or remove it if there was none.
    Enrollment(StudentId, Option<Enrollment>),
    CapacityOverride(Option<u32>),
    WaitlistInserted(StudentId),
    WaitlistRemoved(WaitlistEntry),
}

/// Store keeping every offering in process memory.
pub struct InMemoryStore {
    offerings: RwLock<HashMap<OfferingId, Arc<Mutex<OfferingRecord>>>>,
    lock_timeout: Duration,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create an empty store with the default lock timeout.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create an empty store with a custom lock timeout.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            offerings: RwLock::new(HashMap::new()),
            lock_timeout,
            fail_next_commit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Lock wait applied by [`EnrollmentStore::begin`].
    pub const fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Make the next commit fail with a backend error, for exercising rollback.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::Release);
    }

    /// Number of registered offerings.
    pub fn offering_count(&self) -> usize {
        self.offerings.read().len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Transaction over one offering record. Rolls back on drop unless committed.
pub struct InMemoryTx {
    guard: ArcMutexGuard<RawMutex, OfferingRecord>,
    undo: Vec<Undo>,
    fail_commit: Arc<AtomicBool>,
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        tracing::debug!(offering = %self.guard.offering.id, writes = self.undo.len(), "transaction rolled back");
        let record = &mut *self.guard;
        while let Some(step) = self.undo.pop() {
            record.undo(step);
        }
    }
}

impl OfferingTx for InMemoryTx {
    fn offering(&self) -> &CourseOffering {
        &self.guard.offering
    }

    fn occupancy(&self) -> u32 {
        self.guard.occupying
    }

    fn enrollment(&self, student: StudentId) -> Option<&Enrollment> {
        self.guard.enrollments.get(&student)
    }

    fn enrollments(&self) -> Vec<Enrollment> {
        self.guard.enrollments.values().cloned().collect()
    }

    fn insert_enrollment(&mut self, enrollment: Enrollment) -> Result<InsertOutcome, StoreError> {
        if enrollment.offering != self.guard.offering.id {
            return Err(StoreError::Backend(format!(
                "enrollment for {} written through {} transaction",
                enrollment.offering, self.guard.offering.id
            )));
        }
        if self.guard.enrollments.contains_key(&enrollment.student) {
            return Ok(InsertOutcome::Conflict);
        }
        let student = enrollment.student;
        self.guard.put_enrollment(enrollment);
        self.undo.push(Undo::Enrollment(student, None));
        Ok(InsertOutcome::Inserted)
    }

    fn update_enrollment(&mut self, enrollment: Enrollment) -> Result<(), StoreError> {
        let known = self
            .guard
            .enrollments
            .get(&enrollment.student)
            .is_some_and(|row| row.id == enrollment.id);
        if !known {
            return Err(StoreError::Backend(format!(
                "no enrollment {} for {}",
                enrollment.id, enrollment.student
            )));
        }
        let student = enrollment.student;
        let previous = self.guard.put_enrollment(enrollment);
        self.undo.push(Undo::Enrollment(student, previous));
        Ok(())
    }

    fn set_capacity_override(&mut self, capacity: Option<u32>) {
        let previous = std::mem::replace(&mut self.guard.offering.capacity_override, capacity);
        self.undo.push(Undo::CapacityOverride(previous));
    }

    fn waitlist_entry(&self, student: StudentId) -> Option<&WaitlistEntry> {
        self.guard
            .waitlisted
            .get(&student)
            .and_then(|pos| self.guard.waitlist.get(pos))
    }

    fn waitlist_head(&self) -> Option<&WaitlistEntry> {
        self.guard.waitlist.values().next()
    }

    fn max_position(&self) -> Option<u32> {
        self.guard.waitlist.keys().next_back().copied()
    }

    fn waitlist(&self) -> Vec<WaitlistEntry> {
        self.guard.waitlist.values().cloned().collect()
    }

    fn insert_waitlist(&mut self, entry: WaitlistEntry) -> Result<InsertOutcome, StoreError> {
        if self.guard.waitlisted.contains_key(&entry.student) {
            return Ok(InsertOutcome::Conflict);
        }
        if self.guard.waitlist.contains_key(&entry.position) {
            return Err(StoreError::UniqueViolation(format!(
                "position {} already taken in {}",
                entry.position, entry.offering
            )));
        }
        let student = entry.student;
        self.guard.put_waitlist(entry);
        self.undo.push(Undo::WaitlistInserted(student));
        Ok(InsertOutcome::Inserted)
    }

    fn remove_waitlist(&mut self, student: StudentId) -> Option<WaitlistEntry> {
        let entry = self.guard.take_waitlist(student)?;
        self.undo.push(Undo::WaitlistRemoved(entry.clone()));
        Some(entry)
    }

    fn commit(mut self) -> Result<(), StoreError> {
        if self.fail_commit.swap(false, Ordering::AcqRel) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        self.undo.clear();
        Ok(())
    }
}

impl EnrollmentStore for InMemoryStore {
    type Tx<'a>
        = InMemoryTx
    where
        Self: 'a;

    fn create_offering(&self, offering: CourseOffering) -> Result<(), StoreError> {
        let mut offerings = self.offerings.write();
        if offerings.contains_key(&offering.id) {
            return Err(StoreError::OfferingExists(offering.id));
        }
        offerings.insert(offering.id, Arc::new(Mutex::new(OfferingRecord::new(offering))));
        Ok(())
    }

    fn begin(&self, offering: OfferingId) -> Result<Self::Tx<'_>, StoreError> {
        // Clone the Arc out so the map lock is not held while waiting.
        let record = self
            .offerings
            .read()
            .get(&offering)
            .cloned()
            .ok_or(StoreError::UnknownOffering(offering))?;
        let guard = record
            .try_lock_arc_for(self.lock_timeout)
            .ok_or(StoreError::LockTimeout(offering))?;
        tracing::debug!(%offering, "offering lock acquired");
        Ok(InMemoryTx {
            guard,
            undo: Vec::new(),
            fail_commit: Arc::clone(&self.fail_next_commit),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::thread;

    use super::*;
    use crate::core::enrollment::EnrollmentStatus;
    use crate::core::model::Section;
    use crate::util::ids::{SectionId, WaitlistEntryId};

    fn store_with_offering() -> InMemoryStore {
        let store = InMemoryStore::with_lock_timeout(Duration::from_millis(50));
        store
            .create_offering(CourseOffering::new(
                OfferingId(1),
                Section {
                    id: SectionId(1),
                    default_capacity: NonZeroU32::new(3).unwrap(),
                },
            ))
            .unwrap();
        store
    }

    fn active(student: u64) -> Enrollment {
        Enrollment::new(StudentId(student), OfferingId(1), EnrollmentStatus::Active, 1)
    }

    #[test]
    fn test_uncommitted_writes_roll_back() {
        let store = store_with_offering();
        {
            let mut tx = store.begin(OfferingId(1)).unwrap();
            tx.insert_enrollment(active(1)).unwrap();
            assert_eq!(tx.occupancy(), 1);
        }
        let tx = store.begin(OfferingId(1)).unwrap();
        assert_eq!(tx.occupancy(), 0);
    }

    #[test]
    fn test_commit_persists() {
        let store = store_with_offering();
        let mut tx = store.begin(OfferingId(1)).unwrap();
        tx.insert_enrollment(active(1)).unwrap();
        tx.commit().unwrap();
        assert_eq!(store.begin(OfferingId(1)).unwrap().occupancy(), 1);
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let store = store_with_offering();
        let mut tx = store.begin(OfferingId(1)).unwrap();
        assert_eq!(tx.insert_enrollment(active(1)).unwrap(), InsertOutcome::Inserted);
        assert_eq!(tx.insert_enrollment(active(1)).unwrap(), InsertOutcome::Conflict);
        let n = tx
            .insert_enrollments_ignoring_conflicts(vec![active(1), active(2)])
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_lock_timeout_while_held() {
        let store = Arc::new(store_with_offering());
        let held = store.begin(OfferingId(1)).unwrap();
        let other = Arc::clone(&store);
        let res = thread::spawn(move || other.begin(OfferingId(1)).map(|_| ()))
            .join()
            .unwrap();
        assert!(matches!(res, Err(StoreError::LockTimeout(OfferingId(1)))));
        drop(held);
        assert!(store.begin(OfferingId(1)).is_ok());
    }

    #[test]
    fn test_unknown_offering() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.begin(OfferingId(9)),
            Err(StoreError::UnknownOffering(OfferingId(9)))
        ));
    }

    #[test]
    fn test_injected_commit_failure_discards_writes() {
        let store = store_with_offering();
        store.fail_next_commit();
        let mut tx = store.begin(OfferingId(1)).unwrap();
        tx.insert_enrollment(active(1)).unwrap();
        assert!(tx.commit().is_err());
        assert_eq!(store.begin(OfferingId(1)).unwrap().occupancy(), 0);
    }

    #[test]
    fn test_rollback_restores_every_write() {
        let store = store_with_offering();
        let mut tx = store.begin(OfferingId(1)).unwrap();
        tx.insert_enrollment(active(1)).unwrap();
        tx.insert_enrollment(active(2)).unwrap();
        tx.insert_waitlist(WaitlistEntry {
            id: WaitlistEntryId::new(),
            student: StudentId(3),
            offering: OfferingId(1),
            position: 1,
            added_at_ms: 0,
        })
        .unwrap();
        tx.commit().unwrap();

        {
            let mut tx = store.begin(OfferingId(1)).unwrap();
            let mut dropped = tx.enrollment(StudentId(1)).cloned().unwrap();
            dropped.drop_seat(None, 5).unwrap();
            tx.update_enrollment(dropped).unwrap();
            tx.insert_enrollment(active(4)).unwrap();
            tx.remove_waitlist(StudentId(3)).unwrap();
            tx.set_capacity_override(Some(1));
            assert_eq!(tx.occupancy(), 2);
        }

        let tx = store.begin(OfferingId(1)).unwrap();
        assert_eq!(tx.occupancy(), 2);
        assert_eq!(tx.enrollment(StudentId(1)).unwrap().status, EnrollmentStatus::Active);
        assert!(tx.enrollment(StudentId(4)).is_none());
        assert_eq!(tx.waitlist_head().map(|e| e.student), Some(StudentId(3)));
        assert_eq!(tx.offering().capacity_override, None);
    }

    #[test]
    fn test_occupancy_tracks_status_changes() {
        let store = store_with_offering();
        let mut tx = store.begin(OfferingId(1)).unwrap();
        tx.insert_enrollment(active(1)).unwrap();
        let mut row = tx.enrollment(StudentId(1)).cloned().unwrap();
        row.complete(true, 9).unwrap();
        tx.update_enrollment(row).unwrap();
        assert_eq!(tx.occupancy(), 0);
        tx.commit().unwrap();
        assert_eq!(store.begin(OfferingId(1)).unwrap().occupancy(), 0);
    }

    #[test]
    fn test_waitlist_position_unique() {
        let store = store_with_offering();
        let mut tx = store.begin(OfferingId(1)).unwrap();
        let entry = |student, position| WaitlistEntry {
            id: WaitlistEntryId::new(),
            student: StudentId(student),
            offering: OfferingId(1),
            position,
            added_at_ms: 0,
        };
        tx.insert_waitlist(entry(1, 1)).unwrap();
        assert!(tx.insert_waitlist(entry(2, 1)).is_err());
        assert_eq!(tx.insert_waitlist(entry(1, 2)).unwrap(), InsertOutcome::Conflict);
        tx.insert_waitlist(entry(3, 7)).unwrap();
        assert_eq!(tx.max_position(), Some(7));
        assert_eq!(tx.waitlist_head().map(|e| e.student), Some(StudentId(1)));
        assert_eq!(tx.remove_waitlist(StudentId(1)).map(|e| e.position), Some(1));
        assert_eq!(tx.waitlist_head().map(|e| e.student), Some(StudentId(3)));
    }
}
