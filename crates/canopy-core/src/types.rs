//! Opaque identifiers used throughout Canopy.
//!
//! Every identifier is a random UUID v4 generated in-process at insertion
//! time. There is no shared sequence, so ids are never reused.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The nil identifier (all zero bits).
            #[must_use]
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Whether this is the nil identifier.
            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// The underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Identifier of a user, supplied by the (already authenticated) gateway.
    UserId,
    "user"
);

define_id!(
    /// Identifier of a file or directory node.
    NodeId,
    "node"
);

define_id!(
    /// Identifier of a content-addressed archive.
    ArchiveId,
    "archive"
);

define_id!(
    /// Identifier of a sharing grant.
    GrantId,
    "grant"
);
