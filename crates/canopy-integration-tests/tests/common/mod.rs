//! Shared harness for integration tests.

use std::sync::Arc;

use canopy_core::{CreateFile, Node, NodeId, UserId};
use canopy_index::{AncestorStrategy, IndexOptions, MetadataIndex};
use canopy_storage::{DatabaseOptions, StorageError, TxMode};
use canopy_test::TestStore;

/// Both ancestor walks; permission tests run once per strategy.
#[allow(dead_code)]
pub const STRATEGIES: [AncestorStrategy; 2] =
    [AncestorStrategy::RecursiveQuery, AncestorStrategy::StepWalk];

/// An index over a fresh on-disk database.
///
/// Owns the `TestStore`, so the database file lives as long as the harness.
#[allow(dead_code)]
pub struct IndexHarness {
    /// The index under test.
    pub index: MetadataIndex,
    /// Held to prevent cleanup.
    _store: TestStore,
}

#[allow(dead_code)]
impl IndexHarness {
    /// A file-backed index using the default strategy.
    pub fn new() -> Self {
        Self::with_strategy(AncestorStrategy::default())
    }

    /// A file-backed index using `strategy` for read checks.
    pub fn with_strategy(strategy: AncestorStrategy) -> Self {
        canopy_test::setup_test_logging_default();
        let store = TestStore::new();
        let index = MetadataIndex::open(
            store.database_path(),
            DatabaseOptions::default(),
            IndexOptions::default().with_strategy(strategy),
        )
        .expect("failed to open index");
        Self {
            index,
            _store: store,
        }
    }

    /// A directory at `parent` (or the root).
    pub async fn mkdir(&self, owner: UserId, name: &str, parent: Option<NodeId>) -> Node {
        let mut req = CreateFile::directory(owner, name);
        req.parent_id = parent;
        self.index.create_file(req).await.expect("mkdir failed")
    }

    /// A chain of `depth` nested directories, outermost first.
    pub async fn chain(&self, owner: UserId, depth: usize) -> Vec<Node> {
        let mut nodes: Vec<Node> = Vec::with_capacity(depth);
        for level in 0..depth {
            let parent = nodes.last().map(|n| n.id);
            nodes.push(self.mkdir(owner, &format!("level{level}"), parent).await);
        }
        nodes
    }

    /// Row count of a table, read straight from the store.
    pub async fn count(&self, table: &'static str) -> i64 {
        let db = Arc::clone(self.index.database());
        db.transact(TxMode::Read, move |tx| {
            let n = tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            Ok::<_, StorageError>(n)
        })
        .await
        .expect("count failed")
    }
}
