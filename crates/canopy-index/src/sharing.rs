//! Sharing store: read grants from a node to a user.

use canopy_core::{GrantId, NodeId, ShareRequest, SharingGrant, UserId};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::error::{IndexError, IndexResult};
use crate::rows::{self, GRANT_COLUMNS};
use crate::tree;

fn require_owned(conn: &Connection, file: NodeId, owner: UserId) -> IndexResult<()> {
    tree::find_owned(conn, file, owner)?
        .map(|_| ())
        .ok_or_else(IndexError::denied)
}

pub(crate) fn share(conn: &Connection, req: &ShareRequest) -> IndexResult<SharingGrant> {
    require_owned(conn, req.file_id, req.owner_id)?;
    let grant = SharingGrant {
        id: GrantId::new(),
        file_id: req.file_id,
        target_user_id: req.target_user_id,
        created_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO shares (id, file_id, target_user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            grant.id.0,
            grant.file_id.0,
            grant.target_user_id.0,
            grant.created_at
        ],
    )
    .map_err(|e| {
        IndexError::from_write(e, || {
            format!("{} already shared with {}", req.file_id, req.target_user_id)
        })
    })?;
    Ok(grant)
}

/// Remove the grant if present. Returns whether a grant was removed.
pub(crate) fn unshare(conn: &Connection, req: &ShareRequest) -> IndexResult<bool> {
    require_owned(conn, req.file_id, req.owner_id)?;
    let removed = conn.execute(
        "DELETE FROM shares WHERE file_id = ?1 AND target_user_id = ?2",
        params![req.file_id.0, req.target_user_id.0],
    )?;
    Ok(removed > 0)
}

/// Every grant targeting `user`, oldest first.
pub(crate) fn shared_with(conn: &Connection, user: UserId) -> IndexResult<Vec<SharingGrant>> {
    let sql =
        format!("SELECT {GRANT_COLUMNS} FROM shares WHERE target_user_id = ?1 ORDER BY seq");
    let mut stmt = conn.prepare(&sql)?;
    let grants = stmt
        .query_map(params![user.0], rows::grant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(grants)
}

/// The grants on one owned node, oldest first.
pub(crate) fn grants_on(
    conn: &Connection,
    owner: UserId,
    file: NodeId,
) -> IndexResult<Vec<SharingGrant>> {
    require_owned(conn, file, owner)?;
    let sql = format!("SELECT {GRANT_COLUMNS} FROM shares WHERE file_id = ?1 ORDER BY seq");
    let mut stmt = conn.prepare(&sql)?;
    let grants = stmt
        .query_map(params![file.0], rows::grant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(grants)
}

pub(crate) fn has_grant(conn: &Connection, file: NodeId, user: UserId) -> IndexResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM shares WHERE file_id = ?1 AND target_user_id = ?2)",
        params![file.0, user.0],
        |row| row.get(0),
    )?)
}
