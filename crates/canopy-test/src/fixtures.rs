//! Test fixtures for common types.

use uuid::Uuid;

use canopy_core::{ContentHash, CreateFile, NodeId, UserId};

/// Source of the `hello.go` file used throughout the scenario tests.
pub const HELLO_GO_SOURCE: &str = "package main\nfunc(){}";

/// Length of [`HELLO_GO_SOURCE`] in bytes.
pub const HELLO_GO_SIZE: u64 = 21;

/// Create a test user ID.
#[must_use]
pub fn test_user_id() -> UserId {
    UserId::new()
}

/// Create a test user ID with a specific UUID.
#[must_use]
pub fn test_user_id_from(uuid: Uuid) -> UserId {
    UserId::from_uuid(uuid)
}

/// `N` distinct test users.
#[must_use]
pub fn test_users<const N: usize>() -> [UserId; N] {
    std::array::from_fn(|_| UserId::new())
}

/// Create a test node ID that names no stored node.
#[must_use]
pub fn test_node_id() -> NodeId {
    NodeId::new()
}

/// The `(hash, size)` fingerprint of [`HELLO_GO_SOURCE`].
#[must_use]
pub fn hello_go() -> (ContentHash, u64) {
    (ContentHash::digest(HELLO_GO_SOURCE), HELLO_GO_SIZE)
}

/// The `(hash, size)` fingerprint of arbitrary content.
///
/// # Panics
///
/// Panics if `content` is empty.
#[must_use]
pub fn test_content(content: &str) -> (ContentHash, u64) {
    assert!(!content.is_empty(), "test content must not be empty");
    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    (ContentHash::digest(content), size)
}

/// A root-level directory request.
#[must_use]
pub fn test_directory(owner: UserId, name: &str) -> CreateFile {
    CreateFile::directory(owner, name)
}

/// A root-level file request whose content is its own name.
#[must_use]
pub fn test_file(owner: UserId, name: &str) -> CreateFile {
    let (hash, size) = test_content(name);
    CreateFile::file(owner, name, hash, size)
}

/// A root-level `hello.go` file request.
#[must_use]
pub fn test_hello_go(owner: UserId) -> CreateFile {
    let (hash, size) = hello_go();
    CreateFile::file(owner, "hello.go", hash, size)
}
