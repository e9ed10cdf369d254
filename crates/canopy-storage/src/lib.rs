//! Canopy Storage — transactional persistence for the metadata index.
//!
//! Wraps an embedded SQLite database (through `rusqlite`, bundled) and
//! hands out one session per transaction.
//!
//! # Backends
//!
//! | Mode | Constructor | Sessions |
//! |------|-------------|----------|
//! | On disk | [`Database::open`] | fresh connection per session, WAL journal |
//! | In memory | [`Database::open_memory`] | one shared connection, serialized |
//!
//! Foreign keys are enabled on every connection. Writers take the write
//! lock up front (`BEGIN IMMEDIATE`), readers get a deferred transaction
//! that reads from a single snapshot. Lock waits are bounded by the
//! configured busy timeout; nothing is retried here.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use canopy_storage::{Database, DatabaseOptions, StorageError, TxMode};
//!
//! # async fn run() -> Result<(), StorageError> {
//! let db = Arc::new(Database::open("canopy.db", DatabaseOptions::default())?);
//! let count: i64 = db
//!     .transact(TxMode::Read, |tx| {
//!         Ok::<_, StorageError>(tx.query_row("SELECT 1", [], |row| row.get(0))?)
//!     })
//!     .await?;
//! # let _ = count;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod db;
pub mod error;
pub mod migrate;

pub use db::{Database, DatabaseOptions, TxMode};
pub use error::{StorageError, StorageResult, is_foreign_key_violation, is_unique_violation};
pub use migrate::Migration;

/// Re-export `rusqlite` for callers writing queries against a session.
pub use rusqlite;
