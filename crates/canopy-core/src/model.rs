//! The metadata model: nodes, archives and sharing grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::types::{ArchiveId, GrantId, NodeId, UserId};

/// Whether a node is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A node bound to an archive.
    File,
    /// A node with no archive binding.
    Directory,
}

/// A file or directory entry in the metadata tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier.
    pub id: NodeId,
    /// Owning user. Immutable after creation.
    pub owner_id: UserId,
    /// Parent directory, `None` for a tree root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Bound archive, present exactly when the node is a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_id: Option<ArchiveId>,
    /// Entry name, unique among siblings of the same owner.
    pub name: String,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last moved or renamed.
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// File or directory.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        if self.archive_id.is_some() {
            NodeKind::File
        } else {
            NodeKind::Directory
        }
    }

    /// Whether this node is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind() == NodeKind::Directory
    }

    /// Whether this node sits at the top of its owner's tree.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A content-addressed record for one distinct blob of bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    /// Unique archive identifier.
    pub id: ArchiveId,
    /// Digest of the content.
    pub content_hash: ContentHash,
    /// Content length in bytes, always > 0.
    pub size: u64,
    /// Whether the byte-storage service has confirmed the upload.
    pub ready: bool,
    /// When the archive row was first inserted.
    pub created_at: DateTime<Utc>,
}

/// Read access to one node (and everything below it) for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingGrant {
    /// Unique grant identifier.
    pub id: GrantId,
    /// The shared file or directory.
    pub file_id: NodeId,
    /// The user receiving read access.
    pub target_user_id: UserId,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(archive_id: Option<ArchiveId>) -> Node {
        let now = Utc::now();
        Node {
            id: NodeId::new(),
            owner_id: UserId::new(),
            parent_id: None,
            archive_id,
            name: "Desktop".to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_kind_follows_archive_binding() {
        assert_eq!(node(None).kind(), NodeKind::Directory);
        assert!(node(None).is_directory());
        assert_eq!(node(Some(ArchiveId::new())).kind(), NodeKind::File);
    }

    #[test]
    fn test_root_serialization_omits_parent() {
        let json = serde_json::to_string(&node(None)).unwrap();
        assert!(!json.contains("parent_id"));
        assert!(!json.contains("archive_id"));
        assert!(json.contains("\"name\":\"Desktop\""));
    }
}
