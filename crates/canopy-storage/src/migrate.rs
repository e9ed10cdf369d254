//! Schema migrations tracked through `PRAGMA user_version`.

use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

use crate::error::{StorageError, StorageResult};

/// One forward-only schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version the schema is at after this step. Must increase strictly.
    pub version: u32,
    /// SQL batch applied for this step.
    pub sql: &'static str,
}

/// Apply every migration newer than the database's `user_version`.
///
/// All pending steps run in one immediate transaction, so a failure leaves
/// the schema at its previous version. Returns the number of steps applied.
pub(crate) fn apply(conn: &mut Connection, migrations: &[Migration]) -> StorageResult<usize> {
    if migrations
        .windows(2)
        .any(|pair| pair[0].version >= pair[1].version)
    {
        return Err(StorageError::Migration(
            "migration versions must be strictly increasing".to_owned(),
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current: u32 = tx.pragma_query_value(None, "user_version", |row| row.get(0))?;

    let mut applied: usize = 0;
    for migration in migrations.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql).map_err(|e| {
            StorageError::Migration(format!("version {}: {e}", migration.version))
        })?;
        tx.pragma_update(None, "user_version", migration.version)?;
        applied = applied.saturating_add(1);
        info!(version = migration.version, "applied schema migration");
    }

    tx.commit()?;
    Ok(applied)
}
