//! Tests for utility functions

use std::num::NonZeroU32;

use enrollment_admission::core::{effective_capacity, AutoEnrollStrategy, CourseOffering, Section};
use enrollment_admission::util::{now_ms, OfferingId, SectionId, StudentId};

fn section(capacity: u32) -> Section {
    Section {
        id: SectionId(1),
        default_capacity: NonZeroU32::new(capacity).unwrap(),
    }
}

#[test]
fn test_student_id_from_u64() {
    let id: StudentId = 12345.into();
    assert_eq!(id, StudentId(12345));
}

#[test]
fn test_now_ms_nonzero() {
    assert!(now_ms() > 0);
}

#[test]
fn test_offering_builder() {
    let o = CourseOffering::new(OfferingId(2), section(25))
        .with_capacity_override(10)
        .with_strategy(AutoEnrollStrategy::Section);
    assert_eq!(o.capacity_override, Some(10));
    assert_eq!(o.strategy, AutoEnrollStrategy::Section);
    assert_eq!(effective_capacity(&o).get(), 10);
}

#[test]
fn test_offering_json_defaults_strategy() {
    let json = r#"{
        "id": 5,
        "section": { "id": 1, "default_capacity": 20 },
        "capacity_override": null
    }"#;
    let o: CourseOffering = serde_json::from_str(json).unwrap();
    assert_eq!(o.strategy, AutoEnrollStrategy::None);
    assert_eq!(effective_capacity(&o).get(), 20);
}

#[test]
fn test_zero_section_capacity_rejected_on_parse() {
    let json = r#"{ "id": 1, "default_capacity": 0 }"#;
    assert!(serde_json::from_str::<Section>(json).is_err());
}
