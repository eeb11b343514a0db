//! Infrastructure adapters for storage and event delivery.

pub mod sink;
pub mod store;
pub use sink::ChannelEventSink;
pub use store::InMemoryStore;
