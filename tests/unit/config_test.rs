//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use enrollment_admission::config::AdmissionConfig;

#[test]
fn test_default_config_is_valid() {
    let cfg = AdmissionConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.lock_timeout(), Duration::from_secs(5));
    assert!(cfg.promotion.enabled);
}

#[test]
fn test_zero_lock_timeout_invalid() {
    let cfg = AdmissionConfig {
        lock_timeout_ms: 0,
        ..AdmissionConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_event_buffer_invalid() {
    let cfg = AdmissionConfig {
        event_buffer_capacity: 0,
        ..AdmissionConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "lock_timeout_ms": 250,
        "event_buffer_capacity": 64,
        "promotion": { "enabled": false }
    }"#;

    let cfg = AdmissionConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.lock_timeout_ms, 250);
    assert_eq!(cfg.event_buffer_capacity, 64);
    assert!(!cfg.promotion.enabled);
}

#[test]
fn test_config_from_json_uses_defaults() {
    let cfg = AdmissionConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, AdmissionConfig::default());
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(AdmissionConfig::from_json_str(r#"{"lock_timeout_ms": 0}"#).is_err());
    assert!(AdmissionConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_lookup() {
    let vars: HashMap<&str, &str> = [
        ("ADMISSION_LOCK_TIMEOUT_MS", "1500"),
        ("ADMISSION_PROMOTION_ENABLED", "false"),
    ]
    .into_iter()
    .collect();
    let cfg = AdmissionConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.lock_timeout_ms, 1500);
    assert_eq!(cfg.event_buffer_capacity, 1024);
    assert!(!cfg.promotion.enabled);
}

#[test]
fn test_config_from_lookup_bad_number() {
    let err = AdmissionConfig::from_lookup(|k| {
        (k == "ADMISSION_EVENT_BUFFER").then(|| "lots".to_string())
    })
    .unwrap_err();
    assert!(err.starts_with("ADMISSION_EVENT_BUFFER"));
}
