//! Test harness helpers.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// File name of the database created by [`TestStore`].
pub const TEST_DATABASE_NAME: &str = "canopy.db";

/// Create a temporary directory for testing.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::with_prefix("canopy-").expect("Failed to create temp directory")
}

/// Set up test logging with the given filter.
///
/// Safe to call from every test; only the first call installs a subscriber.
///
/// # Example
///
/// ```rust,ignore
/// use canopy_test::setup_test_logging;
///
/// #[test]
/// fn my_test() {
///     setup_test_logging("canopy_index=debug");
///     // ... test code
/// }
/// ```
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging with default filter (warn level).
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// A temporary directory holding one on-disk database path.
///
/// The database file itself is not created; open it with whatever store
/// the test exercises. Dropping the store removes the directory.
#[derive(Debug)]
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    /// Create a new, empty store directory.
    #[must_use]
    pub fn new() -> Self {
        Self { dir: test_dir() }
    }

    /// The temporary directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Where the database file lives.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.dir.path().join(TEST_DATABASE_NAME)
    }

    /// Write `content` to `name` inside the store directory, e.g. a config
    /// file pointing at [`Self::database_path`].
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}
