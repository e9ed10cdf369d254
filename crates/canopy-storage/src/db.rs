//! SQLite database handle.
//!
//! The [`Database`] struct owns the location of the store and hands out
//! sessions. It holds no other mutable state: on disk every session is a
//! fresh connection; in memory the single connection is the database, so
//! sessions take turns on it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::migrate::{self, Migration};

/// Connection tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseOptions {
    /// How long a session waits for a lock before failing with
    /// [`StorageError::Busy`].
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseOptions {
    /// Set the busy timeout.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// Transaction flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Read-only work; sees one consistent snapshot.
    Read,
    /// Mutations; takes the write lock when the transaction begins.
    Write,
}

impl TxMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            Self::Read => TransactionBehavior::Deferred,
            Self::Write => TransactionBehavior::Immediate,
        }
    }
}

enum Backend {
    File(PathBuf),
    Memory(Mutex<Connection>),
}

/// Handle to a Canopy store.
pub struct Database {
    backend: Backend,
    options: DatabaseOptions,
}

impl Database {
    /// Open (creating if needed) an on-disk database at `path`.
    ///
    /// The file is switched to WAL journaling so readers never block the
    /// writer.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the file cannot be opened or
    /// configured.
    pub fn open(path: impl AsRef<Path>, options: DatabaseOptions) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = connect_file(&path, options)?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|e| StorageError::Connection(format!("failed to enable WAL: {e}")))?;
        debug!(path = %path.display(), journal_mode = %mode, "opened database");
        Ok(Self {
            backend: Backend::File(path),
            options,
        })
    }

    /// Open a private in-memory database (for tests and ephemeral use).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the connection fails.
    pub fn open_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        configure(&conn, DatabaseOptions::default())?;
        debug!("opened in-memory database");
        Ok(Self {
            backend: Backend::Memory(Mutex::new(conn)),
            options: DatabaseOptions::default(),
        })
    }

    /// Path of the database file, `None` in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory(_) => None,
        }
    }

    /// Connection tuning in effect.
    #[must_use]
    pub fn options(&self) -> DatabaseOptions {
        self.options
    }

    /// Run `f` with a session connection.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if no connection can be obtained.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Connection) -> R) -> StorageResult<R> {
        match &self.backend {
            Backend::File(path) => {
                let mut conn = connect_file(path, self.options)?;
                Ok(f(&mut conn))
            },
            Backend::Memory(conn) => {
                let mut guard = conn.lock().map_err(|e| {
                    StorageError::Internal(format!("connection lock poisoned: {e}"))
                })?;
                Ok(f(&mut guard))
            },
        }
    }

    /// Bring the schema up to date.
    ///
    /// Returns the number of migration steps applied.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Migration`] if any step fails; the schema is
    /// then left at its previous version.
    pub fn migrate(&self, migrations: &[Migration]) -> StorageResult<usize> {
        self.with_session(|conn| migrate::apply(conn, migrations))?
    }

    /// Run `f` inside one transaction on the current thread.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back
    /// otherwise. `f`'s error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `f`'s error, or a [`StorageError`] converted into `E` if the
    /// transaction cannot begin or commit.
    pub fn transact_blocking<T, E, F>(&self, mode: TxMode, f: F) -> Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        self.with_session(|conn| -> Result<T, E> {
            let tx = conn
                .transaction_with_behavior(mode.behavior())
                .map_err(StorageError::from)?;
            let value = f(&tx)?;
            tx.commit().map_err(StorageError::from)?;
            Ok(value)
        })
        .map_err(E::from)?
    }

    /// Run `f` inside one transaction on the blocking thread pool.
    ///
    /// Dropping the returned future does not abandon a half-applied
    /// transaction: the blocking task still commits or rolls back.
    ///
    /// # Errors
    ///
    /// See [`Database::transact_blocking`]. A panicked task surfaces as
    /// [`StorageError::Internal`].
    pub async fn transact<T, E, F>(self: &Arc<Self>, mode: TxMode, f: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StorageError> + Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<T, E> + Send + 'static,
    {
        let db = Arc::clone(self);
        match tokio::task::spawn_blocking(move || db.transact_blocking(mode, f)).await {
            Ok(result) => result,
            Err(e) => Err(E::from(StorageError::Internal(format!(
                "transaction task failed: {e}"
            )))),
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn connect_file(path: &Path, options: DatabaseOptions) -> StorageResult<Connection> {
    let conn = Connection::open(path).map_err(|e| {
        StorageError::Connection(format!("failed to open {}: {e}", path.display()))
    })?;
    configure(&conn, options)?;
    Ok(conn)
}

fn configure(conn: &Connection, options: DatabaseOptions) -> StorageResult<()> {
    conn.busy_timeout(options.busy_timeout)
        .map_err(|e| StorageError::Connection(format!("failed to set busy timeout: {e}")))?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| StorageError::Connection(format!("failed to enable foreign keys: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &[Migration] = &[Migration {
        version: 1,
        sql: "CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT NOT NULL);",
    }];

    fn count(db: &Database) -> i64 {
        db.transact_blocking(TxMode::Read, |tx| {
            Ok::<_, StorageError>(tx.query_row("SELECT COUNT(*) FROM kv", [], |r| r.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn test_memory_commit_and_rollback() {
        let db = Database::open_memory().unwrap();
        db.migrate(SCHEMA).unwrap();

        db.transact_blocking(TxMode::Write, |tx| {
            tx.execute("INSERT INTO kv (k, v) VALUES ('a', '1')", [])?;
            Ok::<_, StorageError>(())
        })
        .unwrap();
        assert_eq!(count(&db), 1);

        let result: Result<(), StorageError> = db.transact_blocking(TxMode::Write, |tx| {
            tx.execute("INSERT INTO kv (k, v) VALUES ('b', '2')", [])?;
            Err(StorageError::Internal("abort".to_owned()))
        });
        assert!(result.is_err());
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_memory().unwrap();
        let enabled: i64 = db
            .with_session(|conn| conn.pragma_query_value(None, "foreign_keys", |r| r.get(0)))
            .unwrap()
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_file_database_persists_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canopy.db");
        let db = Database::open(&path, DatabaseOptions::default()).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        db.migrate(SCHEMA).unwrap();

        db.transact_blocking(TxMode::Write, |tx| {
            tx.execute("INSERT INTO kv (k, v) VALUES ('a', '1')", [])?;
            Ok::<_, StorageError>(())
        })
        .unwrap();

        let reopened = Database::open(&path, DatabaseOptions::default()).unwrap();
        assert_eq!(reopened.migrate(SCHEMA).unwrap(), 0);
        assert_eq!(count(&reopened), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_async_transactions_from_many_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(
            Database::open(dir.path().join("canopy.db"), DatabaseOptions::default()).unwrap(),
        );
        db.migrate(SCHEMA).unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move {
                db.transact(TxMode::Write, move |tx| {
                    tx.execute(
                        "INSERT INTO kv (k, v) VALUES (?1, 'x')",
                        [format!("key-{i}")],
                    )?;
                    Ok::<_, StorageError>(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(count(&db), 16);
    }
}
