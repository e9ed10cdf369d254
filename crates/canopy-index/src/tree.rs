//! Tree mutator: create, delete and move nodes.
//!
//! Each function runs inside the caller's transaction and assumes the
//! request already passed its local `check`.

use canopy_core::{ContentHash, CreateFile, MoveFile, Node, NodeId, UserId, ValidationError};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use crate::archive;
use crate::error::{IndexError, IndexResult};
use crate::rows::{self, NODE_COLUMNS};

pub(crate) fn find(conn: &Connection, id: NodeId) -> IndexResult<Option<Node>> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.0], rows::node).optional()?)
}

/// The node, if it exists and belongs to `owner`.
pub(crate) fn find_owned(conn: &Connection, id: NodeId, owner: UserId) -> IndexResult<Option<Node>> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1 AND owner_id = ?2");
    Ok(conn
        .query_row(&sql, params![id.0, owner.0], rows::node)
        .optional()?)
}

/// `Some(parent)` for an existing node (`None` inside for a root), `None`
/// if the node does not exist.
pub(crate) fn parent_of(conn: &Connection, id: NodeId) -> IndexResult<Option<Option<NodeId>>> {
    let parent = conn
        .query_row(
            "SELECT parent_id FROM nodes WHERE id = ?1",
            params![id.0],
            |row| row.get::<_, Option<Uuid>>(0),
        )
        .optional()?;
    Ok(parent.map(|p| p.map(NodeId::from_uuid)))
}

/// Whether `ancestor` appears on the parent chain of `node`, `node` itself
/// included.
pub(crate) fn is_within(conn: &Connection, node: NodeId, ancestor: NodeId) -> IndexResult<bool> {
    let found = conn.query_row(
        "WITH RECURSIVE chain(id, parent_id) AS (
             SELECT id, parent_id FROM nodes WHERE id = ?1
             UNION
             SELECT n.id, n.parent_id FROM nodes n JOIN chain c ON n.id = c.parent_id
         )
         SELECT EXISTS (SELECT 1 FROM chain WHERE id = ?2)",
        params![node.0, ancestor.0],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(found)
}

fn require_directory(node: &Node) -> IndexResult<()> {
    if node.is_directory() {
        Ok(())
    } else {
        Err(ValidationError::ParentNotDirectory(node.name.clone()).into())
    }
}

/// Insert a new node under the request's parent, ensuring its archive
/// first when content is given.
pub(crate) fn create(
    conn: &Connection,
    req: &CreateFile,
    content: Option<(&ContentHash, i64)>,
) -> IndexResult<Node> {
    let parent_id = req.effective_parent();
    if let Some(parent_id) = parent_id {
        let parent = find(conn, parent_id)?
            .ok_or_else(|| IndexError::NotFound(format!("parent directory {parent_id}")))?;
        if parent.owner_id != req.owner_id {
            return Err(IndexError::PermissionDenied(
                "user does not own parent directory".to_owned(),
            ));
        }
        require_directory(&parent)?;
    }

    let archive_id = match content {
        Some((hash, size)) => Some(archive::ensure(conn, hash, size)?.id),
        None => None,
    };

    let now = Utc::now();
    let node = Node {
        id: NodeId::new(),
        owner_id: req.owner_id,
        parent_id,
        archive_id,
        name: req.name.clone(),
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO nodes (id, owner_id, parent_id, archive_id, name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            node.id.0,
            node.owner_id.0,
            node.parent_id.map(|p| p.0),
            node.archive_id.map(|a| a.0),
            node.name,
            node.created_at,
            node.updated_at,
        ],
    )
    .map_err(|e| IndexError::from_write(e, || format!("{:?} already exists", node.name)))?;
    debug!(node_id = %node.id, kind = ?node.kind(), "inserted node");
    Ok(node)
}

/// Delete an owned node; descendants and grants go with it.
pub(crate) fn delete(conn: &Connection, owner: UserId, id: NodeId) -> IndexResult<()> {
    let deleted = conn.execute(
        "DELETE FROM nodes WHERE id = ?1 AND owner_id = ?2",
        params![id.0, owner.0],
    )?;
    if deleted == 0 {
        return Err(IndexError::denied());
    }
    Ok(())
}

/// Apply a move and/or rename. Returns the node as stored afterwards.
pub(crate) fn relocate(conn: &Connection, req: &MoveFile) -> IndexResult<Node> {
    let node = find_owned(conn, req.file_id, req.owner_id)?.ok_or_else(IndexError::denied)?;

    let parent_id = match req.new_parent.map(canopy_core::Placement::parent) {
        None => node.parent_id,
        Some(None) => None,
        Some(Some(target_id)) => {
            let target = find_owned(conn, target_id, req.owner_id)?.ok_or_else(|| {
                IndexError::PermissionDenied("user does not own target directory".to_owned())
            })?;
            require_directory(&target)?;
            if is_within(conn, target.id, node.id)? {
                return Err(IndexError::Conflict(format!(
                    "cannot move {:?} inside itself",
                    node.name
                )));
            }
            Some(target.id)
        },
    };
    let name = req.new_name.clone().unwrap_or_else(|| node.name.clone());

    if parent_id == node.parent_id && name == node.name {
        return Ok(node);
    }

    let updated_at = Utc::now();
    conn.execute(
        "UPDATE nodes SET parent_id = ?1, name = ?2, updated_at = ?3
         WHERE id = ?4 AND owner_id = ?5",
        params![parent_id.map(|p| p.0), name, updated_at, node.id.0, node.owner_id.0],
    )
    .map_err(|e| IndexError::from_write(e, || format!("{name:?} already exists")))?;

    Ok(Node {
        parent_id,
        name,
        updated_at,
        ..node
    })
}
