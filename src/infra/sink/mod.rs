//! Event sink backends.

pub mod channel;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_channel;

pub use channel::ChannelEventSink;
#[cfg(feature = "tokio-runtime")]
pub use tokio_channel::TokioEventSink;
