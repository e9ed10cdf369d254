//! Store schema.
//!
//! Identifiers are stored as 16-byte UUID blobs, timestamps as RFC 3339
//! text.

use canopy_storage::Migration;

/// Schema steps in version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: r"
CREATE TABLE archives (
    id           BLOB PRIMARY KEY NOT NULL,
    content_hash TEXT NOT NULL,
    size         INTEGER NOT NULL CHECK (size > 0),
    ready        INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    UNIQUE (content_hash, size)
);

CREATE TABLE nodes (
    id         BLOB PRIMARY KEY NOT NULL,
    owner_id   BLOB NOT NULL,
    parent_id  BLOB REFERENCES nodes (id) ON DELETE CASCADE,
    archive_id BLOB REFERENCES archives (id),
    name       TEXT NOT NULL CHECK (length(name) > 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (owner_id, parent_id, name)
);

-- NULL parents never collide in the table constraint above.
CREATE UNIQUE INDEX nodes_root_name ON nodes (owner_id, name) WHERE parent_id IS NULL;
CREATE INDEX nodes_parent ON nodes (parent_id);
CREATE INDEX nodes_archive ON nodes (archive_id);

CREATE TABLE shares (
    seq            INTEGER PRIMARY KEY AUTOINCREMENT,
    id             BLOB NOT NULL UNIQUE,
    file_id        BLOB NOT NULL REFERENCES nodes (id) ON DELETE CASCADE,
    target_user_id BLOB NOT NULL,
    created_at     TEXT NOT NULL,
    UNIQUE (file_id, target_user_id)
);

CREATE INDEX shares_target ON shares (target_user_id, seq);
",
}];

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_storage::{Database, StorageError, TxMode};

    #[test]
    fn test_schema_applies_and_is_idempotent() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.migrate(MIGRATIONS).unwrap(), MIGRATIONS.len());
        assert_eq!(db.migrate(MIGRATIONS).unwrap(), 0);

        let tables: Vec<String> = db
            .transact_blocking(TxMode::Read, |tx| {
                let mut stmt = tx.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok::<_, StorageError>(names)
            })
            .unwrap();
        assert_eq!(tables, vec!["archives", "nodes", "shares"]);
    }
}
