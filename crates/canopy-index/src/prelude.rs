//! Prelude module - commonly used types for convenient import.
//!
//! Use `use canopy_index::prelude::*;` to import the index facade together
//! with the core request and model types it works on.

pub use crate::{Access, AncestorStrategy, IndexError, IndexOptions, IndexResult, MetadataIndex};

pub use canopy_core::{
    Archive, CanReadFile, ContentHash, CreateFile, MoveFile, Node, NodeId, Placement,
    ShareRequest, SharingGrant, UserId,
};
