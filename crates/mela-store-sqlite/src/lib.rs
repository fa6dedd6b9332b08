//! SQLite backend for the Mela gathering store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! connection thread without blocking the async runtime. That single
//! thread also gives attendance toggles a total serial order: every
//! read-modify-write executes as one transaction with nothing
//! interleaved.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
