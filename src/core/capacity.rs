//! Effective capacity resolution.
//!
//! Callers making an admission decision must read the offering inside the
//! same transaction that counts occupancy; see [`crate::core::store::OfferingTx::offering`].

use std::num::NonZeroU32;

use crate::core::model::CourseOffering;

/// Seat limit enforced for `offering`: the override if set and at least 1,
/// otherwise the hosting section's default.
pub fn effective_capacity(offering: &CourseOffering) -> NonZeroU32 {
    offering
        .capacity_override
        .and_then(NonZeroU32::new)
        .unwrap_or(offering.section.default_capacity)
}

/// Whether one more seat fits.
pub const fn has_room(occupancy: u32, capacity: NonZeroU32) -> bool {
    occupancy < capacity.get()
}

/// Seats left, saturating at zero when capacity was lowered below occupancy.
pub const fn remaining_seats(occupancy: u32, capacity: NonZeroU32) -> u32 {
    capacity.get().saturating_sub(occupancy)
}
