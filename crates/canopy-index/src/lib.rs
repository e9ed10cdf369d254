//! Canopy Index - the filesystem metadata index.
//!
//! This crate provides:
//! - Content dedup: one archive per distinct `(hash, size)`
//! - The file tree: create, delete (cascading) and move/rename
//! - Sharing grants and their listings
//! - The permission resolver, inherited through directories at any depth
//!
//! All of it is reached through [`MetadataIndex`]. Each call checks its
//! input without touching the store, then runs as a single transaction.
//!
//! # Example
//!
//! ```rust,no_run
//! use canopy_core::{ContentHash, CreateFile, ShareRequest, UserId};
//! use canopy_index::{IndexOptions, IndexResult, MetadataIndex};
//!
//! # async fn run() -> IndexResult<()> {
//! let index = MetadataIndex::in_memory(IndexOptions::default())?;
//! let (alice, bob) = (UserId::new(), UserId::new());
//!
//! let desktop = index.create_file(CreateFile::directory(alice, "Desktop")).await?;
//! let hello = index
//!     .create_file(
//!         CreateFile::file(alice, "hello.go", ContentHash::digest("package main"), 12)
//!             .under(desktop.id),
//!     )
//!     .await?;
//!
//! index.share_file(ShareRequest::new(alice, desktop.id, bob)).await?;
//! assert!(index.can_read(bob, hello.id).await?);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod archive;
mod error;
mod index;
mod resolver;
mod rows;
mod schema;
mod sharing;
mod tree;

pub use error::{IndexError, IndexResult};
pub use index::{IndexOptions, MetadataIndex};
pub use resolver::{Access, AncestorStrategy};
pub use schema::MIGRATIONS;
