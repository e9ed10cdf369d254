//! Request types for the index operations and their local input checks.
//!
//! Every `check` here runs before a transaction is opened and never
//! touches the store.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::hash::ContentHash;
use crate::types::{NodeId, UserId};

/// Check a node name against the naming rule `^[A-Za-z0-9_].*`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidName`] for an empty name or one whose
/// first character is not an ASCII letter, digit or underscore.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    if starts_ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidName {
            name: name.to_owned(),
        })
    }
}

/// Check a content length: positive and representable as a signed 64-bit
/// integer.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyContent`] for zero and
/// [`ValidationError::SizeOutOfRange`] above `i64::MAX`.
pub fn check_size(size: u64) -> ValidationResult<()> {
    if size == 0 {
        return Err(ValidationError::EmptyContent);
    }
    if i64::try_from(size).is_err() {
        return Err(ValidationError::SizeOutOfRange { size });
    }
    Ok(())
}

fn require(id_is_nil: bool, field: &'static str) -> ValidationResult<()> {
    if id_is_nil {
        Err(ValidationError::MissingId { field })
    } else {
        Ok(())
    }
}

/// Create a file (with content) or a directory (without).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFile {
    /// The creating user, who becomes the owner.
    pub owner_id: UserId,
    /// Entry name.
    pub name: String,
    /// Parent directory. `None` or the nil id creates a root node.
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Content digest, files only.
    #[serde(default)]
    pub content_hash: Option<ContentHash>,
    /// Content length, files only.
    #[serde(default)]
    pub size: Option<u64>,
}

impl CreateFile {
    /// A root-level directory.
    #[must_use]
    pub fn directory(owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            owner_id,
            name: name.into(),
            parent_id: None,
            content_hash: None,
            size: None,
        }
    }

    /// A root-level file with the given content fingerprint.
    #[must_use]
    pub fn file(
        owner_id: UserId,
        name: impl Into<String>,
        content_hash: ContentHash,
        size: u64,
    ) -> Self {
        Self {
            owner_id,
            name: name.into(),
            parent_id: None,
            content_hash: Some(content_hash),
            size: Some(size),
        }
    }

    /// Place the new node under `parent`.
    #[must_use]
    pub fn under(mut self, parent: NodeId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// The parent to create under, with the nil id folded into `None`.
    #[must_use]
    pub fn effective_parent(&self) -> Option<NodeId> {
        self.parent_id.filter(|p| !p.is_nil())
    }

    /// The checked `(hash, size)` pair, or `None` for a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyContent`] for a hash without a
    /// positive size, and [`ValidationError::IncompleteContent`] for a size
    /// without a hash.
    pub fn content(&self) -> ValidationResult<Option<(&ContentHash, u64)>> {
        match (&self.content_hash, self.size) {
            (None, None) => Ok(None),
            (Some(_), None | Some(0)) => Err(ValidationError::EmptyContent),
            (Some(hash), Some(size)) => {
                check_size(size)?;
                Ok(Some((hash, size)))
            },
            (None, Some(_)) => Err(ValidationError::IncompleteContent),
        }
    }

    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn check(&self) -> ValidationResult<()> {
        validate_name(&self.name)?;
        require(self.owner_id.is_nil(), "owner UUID")?;
        self.content()?;
        Ok(())
    }
}

/// Where a moved node should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Top of the owner's tree.
    Root,
    /// Inside the given directory.
    Under(NodeId),
}

impl Placement {
    /// The target parent id, `None` for the root.
    #[must_use]
    pub fn parent(self) -> Option<NodeId> {
        match self {
            Self::Root => None,
            Self::Under(id) if id.is_nil() => None,
            Self::Under(id) => Some(id),
        }
    }
}

/// Move and/or rename a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFile {
    /// The requesting user, who must own the node.
    pub owner_id: UserId,
    /// The node to move.
    pub file_id: NodeId,
    /// New location, unchanged when `None`.
    #[serde(default)]
    pub new_parent: Option<Placement>,
    /// New name, unchanged when `None`.
    #[serde(default)]
    pub new_name: Option<String>,
}

impl MoveFile {
    /// A move request that changes nothing yet.
    #[must_use]
    pub fn new(owner_id: UserId, file_id: NodeId) -> Self {
        Self {
            owner_id,
            file_id,
            new_parent: None,
            new_name: None,
        }
    }

    /// Move into `placement`.
    #[must_use]
    pub fn to(mut self, placement: Placement) -> Self {
        self.new_parent = Some(placement);
        self
    }

    /// Rename to `name`.
    #[must_use]
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.new_name = Some(name.into());
        self
    }

    /// Whether the request changes anything.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.new_parent.is_none() && self.new_name.is_none()
    }

    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn check(&self) -> ValidationResult<()> {
        require(self.owner_id.is_nil(), "owner UUID")?;
        require(self.file_id.is_nil(), "file UUID")?;
        if let Some(name) = &self.new_name {
            validate_name(name)?;
        }
        Ok(())
    }
}

/// Grant or revoke read access to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    /// The requesting user, who must own the node.
    pub owner_id: UserId,
    /// The node being shared.
    pub file_id: NodeId,
    /// The user gaining or losing access.
    pub target_user_id: UserId,
}

impl ShareRequest {
    /// Build a share request.
    #[must_use]
    pub fn new(owner_id: UserId, file_id: NodeId, target_user_id: UserId) -> Self {
        Self {
            owner_id,
            file_id,
            target_user_id,
        }
    }

    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingId`] if any identifier is nil.
    pub fn check(&self) -> ValidationResult<()> {
        require(self.owner_id.is_nil(), "owner UUID")?;
        require(self.file_id.is_nil(), "file UUID")?;
        require(self.target_user_id.is_nil(), "target user UUID")
    }
}

/// Ask whether a user may read a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanReadFile {
    /// The asking user.
    pub user_id: UserId,
    /// The node being read.
    pub file_id: NodeId,
}

impl CanReadFile {
    /// Build a read check.
    #[must_use]
    pub fn new(user_id: UserId, file_id: NodeId) -> Self {
        Self { user_id, file_id }
    }

    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingId`] if either identifier is nil.
    pub fn check(&self) -> ValidationResult<()> {
        require(self.user_id.is_nil(), "user UUID")?;
        require(self.file_id.is_nil(), "file UUID")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Desktop").is_ok());
        assert!(validate_name("hello-world.go").is_ok());
        assert!(validate_name("_hidden").is_ok());
        assert!(validate_name("9lives").is_ok());
        assert!(validate_name("a").is_ok());

        assert!(validate_name("").is_err());
        assert!(validate_name(".bashrc").is_err());
        assert!(validate_name("-rf").is_err());
        assert!(validate_name(" leading").is_err());
        assert!(validate_name("écrit").is_err());
    }

    #[test]
    fn test_create_directory_checks() {
        let req = CreateFile::directory(UserId::new(), "Desktop");
        assert!(req.check().is_ok());
        assert_eq!(req.content().unwrap(), None);
    }

    #[test]
    fn test_create_requires_owner() {
        let req = CreateFile::directory(UserId::nil(), "Desktop");
        assert_eq!(
            req.check(),
            Err(ValidationError::MissingId {
                field: "owner UUID"
            })
        );
    }

    #[test]
    fn test_create_rejects_empty_content() {
        let req = CreateFile::file(UserId::new(), "empty.txt", ContentHash::digest(""), 0);
        assert_eq!(req.check(), Err(ValidationError::EmptyContent));

        let mut no_size = CreateFile::file(UserId::new(), "a.txt", ContentHash::digest("a"), 1);
        no_size.size = None;
        assert_eq!(no_size.check(), Err(ValidationError::EmptyContent));
    }

    #[test]
    fn test_check_size() {
        assert!(check_size(21).is_ok());
        assert_eq!(check_size(0), Err(ValidationError::EmptyContent));
        assert_eq!(
            check_size(u64::MAX),
            Err(ValidationError::SizeOutOfRange { size: u64::MAX })
        );
    }

    #[test]
    fn test_create_rejects_size_without_hash() {
        let mut req = CreateFile::directory(UserId::new(), "a.txt");
        req.size = Some(10);
        assert_eq!(req.check(), Err(ValidationError::IncompleteContent));
    }

    #[test]
    fn test_create_name_checked_first() {
        let req = CreateFile::directory(UserId::nil(), ".git");
        assert!(matches!(
            req.check(),
            Err(ValidationError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_nil_parent_is_root() {
        let req = CreateFile::directory(UserId::new(), "Desktop").under(NodeId::nil());
        assert_eq!(req.effective_parent(), None);

        let parent = NodeId::new();
        let req = CreateFile::directory(UserId::new(), "Desktop").under(parent);
        assert_eq!(req.effective_parent(), Some(parent));
    }

    #[test]
    fn test_move_checks() {
        let owner = UserId::new();
        let file = NodeId::new();
        assert!(MoveFile::new(owner, file).is_noop());
        assert!(MoveFile::new(owner, file).check().is_ok());
        assert!(MoveFile::new(owner, file).rename(".x").check().is_err());
        assert!(MoveFile::new(UserId::nil(), file).check().is_err());
        assert!(!MoveFile::new(owner, file).to(Placement::Root).is_noop());
    }

    #[test]
    fn test_placement_parent() {
        let id = NodeId::new();
        assert_eq!(Placement::Root.parent(), None);
        assert_eq!(Placement::Under(NodeId::nil()).parent(), None);
        assert_eq!(Placement::Under(id).parent(), Some(id));
    }

    #[test]
    fn test_share_and_read_checks() {
        let req = ShareRequest::new(UserId::new(), NodeId::new(), UserId::nil());
        assert_eq!(
            req.check(),
            Err(ValidationError::MissingId {
                field: "target user UUID"
            })
        );
        assert!(CanReadFile::new(UserId::new(), NodeId::new()).check().is_ok());
        assert!(CanReadFile::new(UserId::new(), NodeId::nil()).check().is_err());
    }
}
