//! Builders to construct the admission service from configuration.

pub mod admission_builder;

pub use admission_builder::{AdmissionBuilder, AdmissionService};
#[cfg(feature = "tokio-runtime")]
pub use admission_builder::Promotion;
