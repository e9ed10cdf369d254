//! Configuration types for Canopy.
//!
//! These types do not depend on other canopy crates. The resolver strategy
//! is mirrored here and converted where the index is opened. Every section
//! implements [`Default`], so a bare `[section]` header is a working
//! configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Database path that selects a private in-memory store.
pub const MEMORY_DATABASE: &str = ":memory:";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the metadata store lives and how long to wait for its locks.
    pub database: DatabaseSection,
    /// Permission resolver tuning.
    pub resolver: ResolverSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// DatabaseSection
// ---------------------------------------------------------------------------

/// Metadata store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Path of the SQLite file, or [`MEMORY_DATABASE`].
    pub path: String,
    /// Milliseconds a transaction waits for a lock before failing.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "canopy.db".to_owned(),
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseSection {
    /// Whether the configured store is in memory.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_DATABASE
    }

    /// The lock wait as a [`Duration`].
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// ResolverSection
// ---------------------------------------------------------------------------

/// How read checks walk the ancestor chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStrategy {
    /// A single recursive query.
    #[default]
    RecursiveQuery,
    /// One lookup per ancestor.
    StepWalk,
}

/// Permission resolver settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    /// Ancestor walk strategy.
    pub strategy: ResolverStrategy,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["canopy_index=debug"]`).
    pub directives: Vec<String>,
    /// Directory for daily-rotated log files. Logs go to stderr when unset.
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
