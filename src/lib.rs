//! # Enrollment Admission
//!
//! Capacity-safe admission control for course offerings.
//!
//! This library seats students into capacity-limited course offerings, queues
//! overflow on a per-offering waitlist, and bulk-enrolls a section roster when an
//! offering is created. One invariant holds at every committed state, under any
//! number of concurrent callers:
//!
//! > occupying enrollments (`pending` + `active`) ≤ effective capacity
//!
//! ## Core Problem Solved
//!
//! Enrollment demand is bursty: many students race for the last seats near a
//! deadline. An optimistic compare-and-swap retry loop cannot give a stable
//! first-come-first-served order under that contention, so every admission runs
//! as lock → check → insert → commit under one exclusive lock per offering.
//!
//! - **EnrollmentLedger**: atomic `admit`, plus the `drop` / `complete` status machine
//! - **WaitlistQueue**: ordered overflow with `join`, `leave` and `promote`
//! - **AutoEnrollmentBatcher**: idempotent, deterministic roster admission
//! - **CapacityOracle**: [`core::effective_capacity`]
//!
//! Domain events go to an [`core::EventSink`] only after commit, best-effort.
//!
//! ## Example
//!
//! ```rust
//! use std::num::NonZeroU32;
//! use std::sync::Arc;
//!
//! use enrollment_admission::core::{
//!     CourseOffering, EnrollmentLedger, InMemoryEventSink, Rejection, Section,
//! };
//! use enrollment_admission::infra::InMemoryStore;
//! use enrollment_admission::util::{OfferingId, SectionId, StudentId};
//!
//! let ledger = EnrollmentLedger::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(InMemoryEventSink::new(16)),
//! );
//! let section = Section { id: SectionId(1), default_capacity: NonZeroU32::new(30).unwrap() };
//! ledger
//!     .register_offering(CourseOffering::new(OfferingId(7), section).with_capacity_override(1))
//!     .unwrap();
//!
//! assert!(ledger.admit(StudentId(1), OfferingId(7)).unwrap().is_accepted());
//! assert_eq!(
//!     ledger.admit(StudentId(2), OfferingId(7)).unwrap().rejection(),
//!     Some(Rejection::CapacityExceeded),
//! );
//! ```
//!
//! For complete scenarios, see `tests/admission_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Admission components, typed outcomes and storage traits.
pub mod core;
/// Configuration models for the admission service.
pub mod config;
/// Builders to construct the admission service from configuration.
pub mod builders;
/// Store and event-sink adapters.
pub mod infra;
/// Runtime adapters that trigger core operations.
pub mod runtime;
/// Shared utilities.
pub mod util;
