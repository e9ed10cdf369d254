//! Row mappers between SQLite rows and model types.

use canopy_core::{Archive, ArchiveId, ContentHash, GrantId, Node, NodeId, SharingGrant, UserId};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

pub(crate) const NODE_COLUMNS: &str =
    "id, owner_id, parent_id, archive_id, name, created_at, updated_at";
pub(crate) const ARCHIVE_COLUMNS: &str = "id, content_hash, size, ready, created_at";
pub(crate) const GRANT_COLUMNS: &str = "id, file_id, target_user_id, created_at";

pub(crate) fn node(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        id: NodeId::from_uuid(row.get(0)?),
        owner_id: UserId::from_uuid(row.get(1)?),
        parent_id: row.get::<_, Option<Uuid>>(2)?.map(NodeId::from_uuid),
        archive_id: row.get::<_, Option<Uuid>>(3)?.map(ArchiveId::from_uuid),
        name: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub(crate) fn archive(row: &Row<'_>) -> rusqlite::Result<Archive> {
    let raw_hash: String = row.get(1)?;
    let content_hash = ContentHash::parse(&raw_hash)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let raw_size: i64 = row.get(2)?;
    let size =
        u64::try_from(raw_size).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(2, raw_size))?;
    Ok(Archive {
        id: ArchiveId::from_uuid(row.get(0)?),
        content_hash,
        size,
        ready: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn grant(row: &Row<'_>) -> rusqlite::Result<SharingGrant> {
    Ok(SharingGrant {
        id: GrantId::from_uuid(row.get(0)?),
        file_id: NodeId::from_uuid(row.get(1)?),
        target_user_id: UserId::from_uuid(row.get(2)?),
        created_at: row.get(3)?,
    })
}
