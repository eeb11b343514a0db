//! Roster provider abstraction.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::error::AdmissionError;
use crate::util::ids::{SectionId, StudentId};

/// Source of the active students assigned to a section.
///
/// An eventually consistent snapshot is acceptable. Implementations may do
/// network I/O; callers never hold an offering lock across this call.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Active members of `section`.
    async fn members_of(&self, section: SectionId) -> Result<BTreeSet<StudentId>, AdmissionError>;
}

/// In-memory roster for tests and embedded use.
#[derive(Default)]
pub struct StaticRoster {
    sections: RwLock<HashMap<SectionId, BTreeSet<StudentId>>>,
}

impl StaticRoster {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the members of `section`.
    pub fn set_members(&self, section: SectionId, members: impl IntoIterator<Item = StudentId>) {
        self.sections
            .write()
            .insert(section, members.into_iter().collect());
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn members_of(&self, section: SectionId) -> Result<BTreeSet<StudentId>, AdmissionError> {
        Ok(self.sections.read().get(&section).cloned().unwrap_or_default())
    }
}
