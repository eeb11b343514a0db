//! Store backends.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryStore, InMemoryTx};
pub use postgres::PostgresSchema;
