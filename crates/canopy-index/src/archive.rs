//! Content store index: one archive row per distinct `(hash, size)`.

use canopy_core::{Archive, ArchiveId, ContentHash};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::rows::{self, ARCHIVE_COLUMNS};

/// Return the archive for `(hash, size)`, inserting it if no row exists.
///
/// A concurrent writer that got there first is not an error: the insert is
/// ignored and the winning row is read back.
pub(crate) fn ensure(conn: &Connection, hash: &ContentHash, size: i64) -> IndexResult<Archive> {
    let inserted = conn.execute(
        "INSERT INTO archives (id, content_hash, size, ready, created_at)
         VALUES (?1, ?2, ?3, 0, ?4)
         ON CONFLICT (content_hash, size) DO NOTHING",
        params![ArchiveId::new().0, hash.as_str(), size, Utc::now()],
    )?;
    let archive = find_by_content(conn, hash, size)?.ok_or_else(|| {
        IndexError::NotFound(format!("archive {hash}/{size} vanished after insert"))
    })?;
    debug!(
        archive_id = %archive.id,
        content_hash = %hash,
        size,
        created = inserted == 1,
        "ensured archive"
    );
    Ok(archive)
}

pub(crate) fn find_by_content(
    conn: &Connection,
    hash: &ContentHash,
    size: i64,
) -> IndexResult<Option<Archive>> {
    let sql = format!("SELECT {ARCHIVE_COLUMNS} FROM archives WHERE content_hash = ?1 AND size = ?2");
    Ok(conn
        .query_row(&sql, params![hash.as_str(), size], rows::archive)
        .optional()?)
}

pub(crate) fn find(conn: &Connection, id: ArchiveId) -> IndexResult<Option<Archive>> {
    let sql = format!("SELECT {ARCHIVE_COLUMNS} FROM archives WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.0], rows::archive).optional()?)
}

/// Flag the archive as uploaded. Already-ready archives are left as they are.
pub(crate) fn mark_ready(conn: &Connection, hash: &ContentHash, size: i64) -> IndexResult<Archive> {
    let updated = conn.execute(
        "UPDATE archives SET ready = 1 WHERE content_hash = ?1 AND size = ?2",
        params![hash.as_str(), size],
    )?;
    if updated == 0 {
        return Err(IndexError::NotFound(format!("no archive for {hash}/{size}")));
    }
    find_by_content(conn, hash, size)?
        .ok_or_else(|| IndexError::NotFound(format!("no archive for {hash}/{size}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MIGRATIONS;
    use canopy_storage::{Database, TxMode};

    fn db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate(MIGRATIONS).unwrap();
        db
    }

    #[test]
    fn test_ensure_reuses_existing_row() {
        let db = db();
        let hash = ContentHash::digest("package main");
        let (first, second) = db
            .transact_blocking(TxMode::Write, |tx| {
                let first = ensure(tx, &hash, 12)?;
                let second = ensure(tx, &hash, 12)?;
                Ok::<_, IndexError>((first, second))
            })
            .unwrap();
        assert_eq!(first.id, second.id);
        assert!(!first.ready);
        assert_eq!(first.size, 12);
        assert_eq!(first.content_hash, hash);
    }

    #[test]
    fn test_size_is_part_of_identity() {
        let db = db();
        let hash = ContentHash::digest("abc");
        let (a, b) = db
            .transact_blocking(TxMode::Write, |tx| {
                Ok::<_, IndexError>((ensure(tx, &hash, 3)?, ensure(tx, &hash, 4)?))
            })
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_mark_ready() {
        let db = db();
        let hash = ContentHash::digest("abc");
        let ready = db
            .transact_blocking(TxMode::Write, |tx| {
                let archive = ensure(tx, &hash, 3)?;
                let ready = mark_ready(tx, &hash, 3)?;
                assert_eq!(archive.id, ready.id);
                // Second call is a no-op.
                mark_ready(tx, &hash, 3)
            })
            .unwrap();
        assert!(ready.ready);

        let missing = db.transact_blocking(TxMode::Write, |tx| mark_ready(tx, &hash, 99));
        assert!(matches!(missing, Err(IndexError::NotFound(_))));
    }

    #[test]
    fn test_find_by_id() {
        let db = db();
        let hash = ContentHash::digest("xyz");
        db.transact_blocking(TxMode::Write, |tx| {
            let archive = ensure(tx, &hash, 3)?;
            assert_eq!(find(tx, archive.id)?, Some(archive));
            assert_eq!(find(tx, ArchiveId::new())?, None);
            Ok::<_, IndexError>(())
        })
        .unwrap();
    }
}
