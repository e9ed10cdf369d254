//! Canopy Test - Shared test utilities for the Canopy metadata index.
//!
//! This crate provides fixtures and harness helpers that can be used across
//! multiple Canopy crates as a dev-dependency. It depends only on
//! `canopy-core`, so any crate above it may pull it in.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! canopy-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use canopy_test::{hello_go, test_user_id};
//! use canopy_core::CreateFile;
//!
//! #[tokio::test]
//! async fn test_create_hello() {
//!     let index = canopy_index::MetadataIndex::in_memory(Default::default()).unwrap();
//!     let (hash, size) = hello_go();
//!     let node = index
//!         .create_file(CreateFile::file(test_user_id(), "hello.go", hash, size))
//!         .await
//!         .unwrap();
//!     assert!(!node.is_directory());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
