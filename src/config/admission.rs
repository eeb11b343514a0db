//! Admission service configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Promotion worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Run the drop-triggered promotion worker.
    #[serde(default = "default_promotion_enabled")]
    pub enabled: bool,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            enabled: default_promotion_enabled(),
        }
    }
}

/// Root admission configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum wait for an offering lock, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Buffer size for in-memory and bounded channel event sinks.
    #[serde(default = "default_event_buffer_capacity")]
    pub event_buffer_capacity: usize,
    /// Promotion worker settings.
    #[serde(default)]
    pub promotion: PromotionConfig,
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}

const fn default_event_buffer_capacity() -> usize {
    1_024
}

const fn default_promotion_enabled() -> bool {
    true
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            event_buffer_capacity: default_event_buffer_capacity(),
            promotion: PromotionConfig::default(),
        }
    }
}

impl AdmissionConfig {
    /// Lock timeout as a `Duration`.
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.lock_timeout_ms == 0 {
            return Err("lock_timeout_ms must be greater than 0".into());
        }
        if self.event_buffer_capacity == 0 {
            return Err("event_buffer_capacity must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build from `ADMISSION_*` environment variables, loading `.env` first if
    /// present. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Used by [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut cfg = Self::default();
        if let Some(v) = lookup("ADMISSION_LOCK_TIMEOUT_MS") {
            cfg.lock_timeout_ms = v
                .parse()
                .map_err(|e| format!("ADMISSION_LOCK_TIMEOUT_MS: {e}"))?;
        }
        if let Some(v) = lookup("ADMISSION_EVENT_BUFFER") {
            cfg.event_buffer_capacity = v
                .parse()
                .map_err(|e| format!("ADMISSION_EVENT_BUFFER: {e}"))?;
        }
        if let Some(v) = lookup("ADMISSION_PROMOTION_ENABLED") {
            cfg.promotion.enabled = v
                .parse()
                .map_err(|e| format!("ADMISSION_PROMOTION_ENABLED: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
