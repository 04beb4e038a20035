//! SQLite backend for the Tally attendance store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every command runs as one transaction
//! through [`SqliteStore::transact`], which hands a [`SqliteLedger`] to a
//! closure executing on that thread.

mod encode;
mod ledger;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use ledger::SqliteLedger;
pub use store::{SqliteStore, UserFlags};

#[cfg(test)]
mod tests;
