//! Tests for builder modules

use std::sync::Arc;
use std::time::Duration;

use enrollment_admission::builders::AdmissionBuilder;
use enrollment_admission::config::AdmissionConfig;
use enrollment_admission::core::{AdmissionError, StaticRoster};
use enrollment_admission::infra::InMemoryStore;

#[test]
fn test_builder_exposes_config() {
    let builder = AdmissionBuilder::new(AdmissionConfig {
        event_buffer_capacity: 8,
        ..AdmissionConfig::default()
    });
    assert_eq!(builder.config().event_buffer_capacity, 8);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let builder = AdmissionBuilder::new(AdmissionConfig {
        lock_timeout_ms: 0,
        ..AdmissionConfig::default()
    });
    let sink = builder.in_memory_sink();
    let result = builder.build_in_memory(sink, Arc::new(StaticRoster::new()));
    assert!(matches!(result, Err(AdmissionError::Backend(msg)) if msg.starts_with("config invalid")));
}

#[test]
fn test_builder_with_custom_store() {
    let builder = AdmissionBuilder::new(AdmissionConfig::default());
    let (sink, _rx) = builder.channel_sink();
    let store = Arc::new(InMemoryStore::new());
    let svc = builder
        .build_with_store(Arc::clone(&store), sink, Arc::new(StaticRoster::new()))
        .unwrap();
    assert!(Arc::ptr_eq(svc.ledger.store(), &store));
    assert!(Arc::ptr_eq(svc.waitlist.ledger().store(), &store));
}

#[test]
fn test_custom_store_keeps_its_lock_timeout() {
    let builder = AdmissionBuilder::new(AdmissionConfig {
        lock_timeout_ms: 900,
        ..AdmissionConfig::default()
    });
    let sink = builder.in_memory_sink();
    let store = Arc::new(InMemoryStore::with_lock_timeout(Duration::from_millis(7)));
    let svc = builder
        .build_with_store(store, sink, Arc::new(StaticRoster::new()))
        .unwrap();
    assert_eq!(svc.ledger.store().lock_timeout(), Duration::from_millis(7));
}
