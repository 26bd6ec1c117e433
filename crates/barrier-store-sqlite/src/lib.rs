//! SQLite backend for the barrier case store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutation writes an audit row in
//! the same transaction.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{AuditEntry, SqliteStore};

#[cfg(test)]
mod tests;
