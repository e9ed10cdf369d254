//! Canopy Core - Foundation types for the Canopy filesystem metadata index.
//!
//! This crate provides:
//! - Opaque identifiers for users, nodes, archives and sharing grants
//! - The metadata model ([`Node`], [`Archive`], [`SharingGrant`])
//! - Content hashing ([`ContentHash`])
//! - Request types with their input validation rules
//!
//! Nothing here touches storage. Validation in this crate is the cheap,
//! local check that runs before any transaction is opened.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod error;
pub mod hash;
pub mod model;
pub mod request;
pub mod types;

pub use error::{ValidationError, ValidationResult};
pub use hash::ContentHash;
pub use model::{Archive, Node, NodeKind, SharingGrant};
pub use request::{
    CanReadFile, CreateFile, MoveFile, Placement, ShareRequest, check_size, validate_name,
};
pub use types::{ArchiveId, GrantId, NodeId, UserId};
