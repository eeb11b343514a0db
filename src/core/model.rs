//! Offering, section and waitlist records.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::util::ids::{OfferingId, SectionId, StudentId, WaitlistEntryId};

/// Roster-based enrollment policy, consulted once when an offering is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoEnrollStrategy {
    /// No automatic enrollment.
    #[default]
    None,
    /// Enroll every active student of the hosting section.
    Section,
}

/// Hosting section of an offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section identifier.
    pub id: SectionId,
    /// Seat limit used when the offering has no override.
    pub default_capacity: NonZeroU32,
}

/// A capacity-limited course offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOffering {
    /// Offering identifier.
    pub id: OfferingId,
    /// Hosting section.
    pub section: Section,
    /// Explicit seat limit. Values below 1 are ignored.
    pub capacity_override: Option<u32>,
    /// Auto-enrollment policy.
    #[serde(default)]
    pub strategy: AutoEnrollStrategy,
}

impl CourseOffering {
    /// Offering with no override and no auto-enrollment.
    pub const fn new(id: OfferingId, section: Section) -> Self {
        Self {
            id,
            section,
            capacity_override: None,
            strategy: AutoEnrollStrategy::None,
        }
    }

    /// Set an explicit capacity override.
    #[must_use]
    pub const fn with_capacity_override(mut self, capacity: u32) -> Self {
        self.capacity_override = Some(capacity);
        self
    }

    /// Set the auto-enrollment strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: AutoEnrollStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// A student queued for a seat in a full offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Row identifier.
    pub id: WaitlistEntryId,
    /// Waiting student.
    pub student: StudentId,
    /// Offering waited on.
    pub offering: OfferingId,
    /// Priority rank; lower is served first. Unique per offering, may have gaps.
    pub position: u32,
    /// Join timestamp.
    pub added_at_ms: u128,
}
