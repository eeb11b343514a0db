//! Runtime adapters that drive the core from outside.

#[cfg(feature = "tokio-runtime")]
pub mod promoter;

#[cfg(feature = "tokio-runtime")]
pub use promoter::{PromotionStats, PromotionWorker};
