//! Permission resolver.
//!
//! A user may read a node when they own it, when it is shared with them,
//! or when any ancestor is shared with them. The ancestor chain is walked
//! without a depth limit. Missing nodes and unreadable nodes produce the
//! same denial.

use std::collections::HashSet;

use canopy_core::{NodeId, UserId};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{IndexError, IndexResult};
use crate::{sharing, tree};

/// How the ancestor chain is walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorStrategy {
    /// One recursive query joining the chain against the grants.
    #[default]
    RecursiveQuery,
    /// One parent lookup and one grant lookup per level.
    StepWalk,
}

impl From<canopy_config::ResolverStrategy> for AncestorStrategy {
    fn from(strategy: canopy_config::ResolverStrategy) -> Self {
        match strategy {
            canopy_config::ResolverStrategy::RecursiveQuery => Self::RecursiveQuery,
            canopy_config::ResolverStrategy::StepWalk => Self::StepWalk,
        }
    }
}

/// Why a read was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Access {
    /// The user owns the node.
    Owner,
    /// The node itself is shared with the user.
    DirectShare,
    /// An ancestor is shared with the user.
    InheritedShare {
        /// The nearest shared ancestor.
        via: NodeId,
        /// Levels between the node and `via`; a parent is at depth 1.
        depth: u64,
    },
}

/// Decide whether `user` may read `file`.
pub(crate) fn resolve(
    conn: &Connection,
    user: UserId,
    file: NodeId,
    strategy: AncestorStrategy,
) -> IndexResult<Access> {
    if tree::find_owned(conn, file, user)?.is_some() {
        return Ok(Access::Owner);
    }
    if sharing::has_grant(conn, file, user)? {
        return Ok(Access::DirectShare);
    }
    let inherited = match strategy {
        AncestorStrategy::RecursiveQuery => shared_ancestor_query(conn, user, file)?,
        AncestorStrategy::StepWalk => shared_ancestor_walk(conn, user, file)?,
    };
    match inherited {
        Some((via, depth)) => Ok(Access::InheritedShare { via, depth }),
        None => {
            debug!(user_id = %user, node_id = %file, ?strategy, "read denied");
            Err(IndexError::denied())
        },
    }
}

/// The chain is cut off after as many steps as there are nodes, which no
/// acyclic chain can exceed.
fn shared_ancestor_query(
    conn: &Connection,
    user: UserId,
    file: NodeId,
) -> IndexResult<Option<(NodeId, u64)>> {
    let node_count: i64 = conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
    let found = conn
        .query_row(
            "WITH RECURSIVE chain(id, parent_id, depth) AS (
                 SELECT id, parent_id, 0 FROM nodes WHERE id = ?1
                 UNION
                 SELECT n.id, n.parent_id, c.depth + 1
                 FROM nodes n JOIN chain c ON n.id = c.parent_id
                 WHERE c.depth < ?3
             )
             SELECT c.id, c.depth FROM chain c
             JOIN shares s ON s.file_id = c.id
             WHERE s.target_user_id = ?2 AND c.depth > 0
             ORDER BY c.depth
             LIMIT 1",
            params![file.0, user.0, node_count],
            |row| Ok((row.get::<_, Uuid>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;
    Ok(found.map(|(id, depth)| {
        (
            NodeId::from_uuid(id),
            u64::try_from(depth).unwrap_or_default(),
        )
    }))
}

fn shared_ancestor_walk(
    conn: &Connection,
    user: UserId,
    file: NodeId,
) -> IndexResult<Option<(NodeId, u64)>> {
    let mut visited = HashSet::from([file]);
    let mut current = tree::parent_of(conn, file)?.flatten();
    let mut depth: u64 = 1;
    while let Some(id) = current {
        if !visited.insert(id) {
            break;
        }
        if sharing::has_grant(conn, id, user)? {
            return Ok(Some((id, depth)));
        }
        current = tree::parent_of(conn, id)?.flatten();
        depth = depth.saturating_add(1);
    }
    Ok(None)
}
