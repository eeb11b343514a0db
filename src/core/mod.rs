//! Core admission-control components and their shared types.

pub mod batcher;
pub mod capacity;
pub mod enrollment;
pub mod error;
pub mod events;
pub mod ledger;
pub mod model;
pub mod roster;
pub mod store;
pub mod waitlist;

pub use batcher::{AutoEnrollmentBatcher, BatchReport};
pub use capacity::effective_capacity;
pub use enrollment::{Enrollment, EnrollmentStatus};
pub use error::{AdmissionError, AppResult, Decision, EventError, Rejection, StoreError};
pub use events::{AutoEnrollPartial, DomainEvent, EventSink, InMemoryEventSink};
pub use ledger::EnrollmentLedger;
pub use model::{AutoEnrollStrategy, CourseOffering, Section, WaitlistEntry};
pub use roster::{RosterProvider, StaticRoster};
pub use store::{EnrollmentStore, InsertOutcome, OfferingTx};
pub use waitlist::WaitlistQueue;
