//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{ValidationError, ValidationResult};

// Identifiers
pub use crate::{ArchiveId, GrantId, NodeId, UserId};

// Model
pub use crate::{Archive, ContentHash, Node, NodeKind, SharingGrant};

// Requests
pub use crate::{CanReadFile, CreateFile, MoveFile, Placement, ShareRequest};
