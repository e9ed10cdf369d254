//! The metadata index facade.
//!
//! [`MetadataIndex`] is the only entry point the gateway calls. Every
//! operation validates its input locally, then runs as one transaction on
//! the blocking pool.

use std::path::Path;
use std::sync::Arc;

use canopy_config::Config;
use canopy_core::{
    Archive, CanReadFile, ContentHash, CreateFile, MoveFile, Node, NodeId, ShareRequest,
    SharingGrant, UserId, ValidationError, check_size,
};
use canopy_storage::{Database, DatabaseOptions, TxMode};
use tracing::{debug, info, warn};

use crate::error::{IndexError, IndexResult};
use crate::resolver::{self, Access, AncestorStrategy};
use crate::schema::MIGRATIONS;
use crate::{archive, sharing, tree};

/// Index behaviour that is not part of the store itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOptions {
    /// Ancestor walk used by read checks.
    pub strategy: AncestorStrategy,
}

impl IndexOptions {
    /// Use `strategy` for read checks.
    #[must_use]
    pub fn with_strategy(mut self, strategy: AncestorStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Filesystem metadata index over a Canopy store.
///
/// Cheap to clone; clones share the same database handle.
#[derive(Debug, Clone)]
pub struct MetadataIndex {
    db: Arc<Database>,
    options: IndexOptions,
}

fn sql_size(size: u64) -> IndexResult<i64> {
    check_size(size)?;
    i64::try_from(size).map_err(|_| ValidationError::SizeOutOfRange { size }.into())
}

fn log_failure(operation: &'static str, err: &IndexError) {
    match err {
        IndexError::PermissionDenied(_) | IndexError::Conflict(_) => {
            warn!(operation, error = %err, "request refused");
        },
        IndexError::Storage(_) => warn!(operation, error = %err, "storage failure"),
        IndexError::Validation(_) | IndexError::NotFound(_) => {
            debug!(operation, error = %err, "request rejected");
        },
    }
}

impl MetadataIndex {
    /// Wrap an open database, bringing its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Storage`] if a migration fails.
    pub fn new(db: Arc<Database>, options: IndexOptions) -> IndexResult<Self> {
        let applied = db.migrate(MIGRATIONS)?;
        if applied > 0 {
            info!(applied, "metadata schema updated");
        }
        Ok(Self { db, options })
    }

    /// Open an on-disk index at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Storage`] if the database cannot be opened or
    /// migrated.
    pub fn open(
        path: impl AsRef<Path>,
        db_options: DatabaseOptions,
        options: IndexOptions,
    ) -> IndexResult<Self> {
        let db = Database::open(path, db_options)?;
        Self::new(Arc::new(db), options)
    }

    /// A private in-memory index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Storage`] if the database cannot be created.
    pub fn in_memory(options: IndexOptions) -> IndexResult<Self> {
        Self::new(Arc::new(Database::open_memory()?), options)
    }

    /// Open the index described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Storage`] if the database cannot be opened or
    /// migrated.
    pub fn from_config(config: &Config) -> IndexResult<Self> {
        let options = IndexOptions::default().with_strategy(config.resolver.strategy.into());
        if config.database.is_memory() {
            return Self::in_memory(options);
        }
        let db_options = DatabaseOptions::default().with_busy_timeout(config.database.busy_timeout());
        Self::open(&config.database.path, db_options, options)
    }

    /// The underlying database handle.
    #[must_use]
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> IndexOptions {
        self.options
    }

    async fn run<T, F>(&self, operation: &'static str, mode: TxMode, f: F) -> IndexResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> IndexResult<T> + Send + 'static,
    {
        self.db
            .transact(mode, move |tx| f(tx))
            .await
            .inspect_err(|e| log_failure(operation, e))
    }

    /// Find or create the archive for `(hash, size)`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Validation`] for a zero or oversized `size`.
    pub async fn ensure_archive(&self, hash: ContentHash, size: u64) -> IndexResult<Archive> {
        let sql_size = sql_size(size)?;
        self.run("ensure_archive", TxMode::Write, move |conn| {
            archive::ensure(conn, &hash, sql_size)
        })
        .await
    }

    /// Flag the archive for `(hash, size)` as uploaded.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if no such archive exists.
    pub async fn mark_archive_ready(&self, hash: ContentHash, size: u64) -> IndexResult<Archive> {
        let sql_size = sql_size(size)?;
        let archive = self
            .run("mark_archive_ready", TxMode::Write, move |conn| {
                archive::mark_ready(conn, &hash, sql_size)
            })
            .await?;
        info!(archive_id = %archive.id, "archive ready");
        Ok(archive)
    }

    /// Create a file or directory.
    ///
    /// # Errors
    ///
    /// - [`IndexError::Validation`] for a bad name, nil owner, inconsistent
    ///   content or a parent that is a file
    /// - [`IndexError::NotFound`] if the parent does not exist
    /// - [`IndexError::PermissionDenied`] if someone else owns the parent
    /// - [`IndexError::Conflict`] on a sibling name collision
    pub async fn create_file(&self, req: CreateFile) -> IndexResult<Node> {
        req.check()?;
        let content = match req.content()? {
            Some((hash, size)) => Some((hash.clone(), sql_size(size)?)),
            None => None,
        };
        let node = self
            .run("create_file", TxMode::Write, move |conn| {
                tree::create(conn, &req, content.as_ref().map(|(h, s)| (h, *s)))
            })
            .await?;
        info!(
            node_id = %node.id,
            owner_id = %node.owner_id,
            kind = ?node.kind(),
            "created node"
        );
        Ok(node)
    }

    /// Delete a node and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PermissionDenied`] if `owner` has no such node.
    pub async fn delete_file(&self, owner: UserId, file: NodeId) -> IndexResult<()> {
        if owner.is_nil() {
            return Err(ValidationError::MissingId { field: "owner UUID" }.into());
        }
        if file.is_nil() {
            return Err(ValidationError::MissingId { field: "file UUID" }.into());
        }
        self.run("delete_file", TxMode::Write, move |conn| {
            tree::delete(conn, owner, file)
        })
        .await?;
        info!(node_id = %file, owner_id = %owner, "deleted node");
        Ok(())
    }

    /// Move and/or rename a node. A request changing nothing succeeds
    /// without touching the store.
    ///
    /// # Errors
    ///
    /// - [`IndexError::Validation`] for a bad name or a file as target
    /// - [`IndexError::PermissionDenied`] if the node or the target
    ///   directory is not owned by the requester
    /// - [`IndexError::Conflict`] on a name collision or a move into the
    ///   node's own subtree
    pub async fn move_file(&self, req: MoveFile) -> IndexResult<()> {
        req.check()?;
        if req.is_noop() {
            return Ok(());
        }
        let node = self
            .run("move_file", TxMode::Write, move |conn| tree::relocate(conn, &req))
            .await?;
        info!(
            node_id = %node.id,
            parent_id = ?node.parent_id,
            name = %node.name,
            "moved node"
        );
        Ok(())
    }

    /// Give `target_user_id` read access to a node and its subtree.
    ///
    /// # Errors
    ///
    /// - [`IndexError::PermissionDenied`] if the requester does not own the node
    /// - [`IndexError::Conflict`] if the grant already exists
    pub async fn share_file(&self, req: ShareRequest) -> IndexResult<SharingGrant> {
        req.check()?;
        let grant = self
            .run("share_file", TxMode::Write, move |conn| sharing::share(conn, &req))
            .await?;
        info!(
            grant_id = %grant.id,
            node_id = %grant.file_id,
            target_user_id = %grant.target_user_id,
            "shared node"
        );
        Ok(grant)
    }

    /// Revoke a grant. Revoking a grant that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PermissionDenied`] if the requester does not
    /// own the node.
    pub async fn unshare_file(&self, req: ShareRequest) -> IndexResult<()> {
        req.check()?;
        let removed = self
            .run("unshare_file", TxMode::Write, move |conn| sharing::unshare(conn, &req))
            .await?;
        info!(
            node_id = %req.file_id,
            target_user_id = %req.target_user_id,
            removed,
            "unshared node"
        );
        Ok(())
    }

    /// Grants targeting `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Validation`] for a nil user.
    pub async fn share_with_me(&self, user: UserId) -> IndexResult<Vec<SharingGrant>> {
        if user.is_nil() {
            return Err(ValidationError::MissingId { field: "user UUID" }.into());
        }
        self.run("share_with_me", TxMode::Read, move |conn| {
            sharing::shared_with(conn, user)
        })
        .await
    }

    /// Grants on one of `owner`'s nodes, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PermissionDenied`] if `owner` has no such node.
    pub async fn share_with_who(
        &self,
        owner: UserId,
        file: NodeId,
    ) -> IndexResult<Vec<SharingGrant>> {
        if owner.is_nil() {
            return Err(ValidationError::MissingId { field: "owner UUID" }.into());
        }
        if file.is_nil() {
            return Err(ValidationError::MissingId { field: "file UUID" }.into());
        }
        self.run("share_with_who", TxMode::Read, move |conn| {
            sharing::grants_on(conn, owner, file)
        })
        .await
    }

    /// Why `req.user_id` may read `req.file_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PermissionDenied`] if the user may not read the
    /// node or the node does not exist.
    pub async fn access(&self, req: CanReadFile) -> IndexResult<Access> {
        req.check()?;
        let strategy = self.options.strategy;
        let access = self
            .run("can_read", TxMode::Read, move |conn| {
                resolver::resolve(conn, req.user_id, req.file_id, strategy)
            })
            .await?;
        debug!(user_id = %req.user_id, node_id = %req.file_id, ?access, "read allowed");
        Ok(access)
    }

    /// `Ok(true)` if `user` may read `file`.
    ///
    /// # Errors
    ///
    /// See [`MetadataIndex::access`].
    pub async fn can_read(&self, user: UserId, file: NodeId) -> IndexResult<bool> {
        self.access(CanReadFile::new(user, file)).await.map(|_| true)
    }

    /// The archive behind a readable file.
    ///
    /// # Errors
    ///
    /// - [`IndexError::PermissionDenied`] as for [`MetadataIndex::access`]
    /// - [`IndexError::NotFound`] if the node is a directory
    pub async fn query_file(&self, user: UserId, file: NodeId) -> IndexResult<Archive> {
        let req = CanReadFile::new(user, file);
        req.check()?;
        let strategy = self.options.strategy;
        self.run("query_file", TxMode::Read, move |conn| {
            resolver::resolve(conn, user, file, strategy)?;
            let node = tree::find(conn, file)?
                .ok_or_else(|| IndexError::NotFound(format!("node {file}")))?;
            let archive_id = node
                .archive_id
                .ok_or_else(|| IndexError::NotFound(format!("{:?} is a directory", node.name)))?;
            archive::find(conn, archive_id)?
                .ok_or_else(|| IndexError::NotFound(format!("archive {archive_id}")))
        })
        .await
    }

    /// Metadata of a readable node.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PermissionDenied`] as for
    /// [`MetadataIndex::access`].
    pub async fn get_node(&self, user: UserId, file: NodeId) -> IndexResult<Node> {
        let req = CanReadFile::new(user, file);
        req.check()?;
        let strategy = self.options.strategy;
        self.run("get_node", TxMode::Read, move |conn| {
            resolver::resolve(conn, user, file, strategy)?;
            tree::find(conn, file)?.ok_or_else(|| IndexError::NotFound(format!("node {file}")))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::Placement;
    use canopy_test::{TestStore, hello_go, test_hello_go, test_users};

    fn index() -> MetadataIndex {
        MetadataIndex::in_memory(IndexOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn test_validation_precedes_store_access() {
        let index = index();
        let err = index
            .create_file(CreateFile::directory(UserId::new(), ".hidden").under(NodeId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Validation(ValidationError::InvalidName { .. })));

        let err = index.ensure_archive(hello_go().0, 0).await.unwrap_err();
        assert!(matches!(err, IndexError::Validation(ValidationError::EmptyContent)));

        let err = index.can_read(UserId::nil(), NodeId::new()).await.unwrap_err();
        assert!(matches!(err, IndexError::Validation(_)));
        let err = index.share_with_me(UserId::nil()).await.unwrap_err();
        assert!(matches!(err, IndexError::Validation(_)));
    }

    #[tokio::test]
    async fn test_query_file_returns_bound_archive() {
        let index = index();
        let owner = UserId::new();
        let (hash, size) = hello_go();
        let file = index.create_file(test_hello_go(owner)).await.unwrap();

        let archive = index.query_file(owner, file.id).await.unwrap();
        assert_eq!(archive.content_hash, hash);
        assert_eq!(archive.size, size);
        assert_eq!(Some(archive.id), file.archive_id);

        let dedup = index.ensure_archive(hash.clone(), size).await.unwrap();
        assert_eq!(dedup.id, archive.id);
        assert!(index.mark_archive_ready(hash, size).await.unwrap().ready);
    }

    #[tokio::test]
    async fn test_query_directory_is_not_found() {
        let index = index();
        let owner = UserId::new();
        let dir = index
            .create_file(CreateFile::directory(owner, "Desktop"))
            .await
            .unwrap();
        assert!(index.query_file(owner, dir.id).await.unwrap_err().is_not_found());
        assert_eq!(index.get_node(owner, dir.id).await.unwrap().name, "Desktop");
    }

    #[tokio::test]
    async fn test_noop_move_skips_ownership_check() {
        let index = index();
        index
            .move_file(MoveFile::new(UserId::new(), NodeId::new()))
            .await
            .unwrap();
        let err = index
            .move_file(MoveFile::new(UserId::new(), NodeId::new()).to(Placement::Root))
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[tokio::test]
    async fn test_access_reports_rule() {
        for strategy in [AncestorStrategy::RecursiveQuery, AncestorStrategy::StepWalk] {
            let index = MetadataIndex::in_memory(IndexOptions::default().with_strategy(strategy))
                .unwrap();
            let [owner, reader] = test_users::<2>();
            let dir = index
                .create_file(CreateFile::directory(owner, "Desktop"))
                .await
                .unwrap();
            let file = index
                .create_file(test_hello_go(owner).under(dir.id))
                .await
                .unwrap();
            index
                .share_file(ShareRequest::new(owner, dir.id, reader))
                .await
                .unwrap();

            assert_eq!(
                index.access(CanReadFile::new(owner, file.id)).await.unwrap(),
                Access::Owner
            );
            assert_eq!(
                index.access(CanReadFile::new(reader, file.id)).await.unwrap(),
                Access::InheritedShare {
                    via: dir.id,
                    depth: 1
                }
            );
            assert!(index.get_node(reader, file.id).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_file_backed_index_reopens() {
        let store = TestStore::new();
        let path = store.database_path();
        let owner = UserId::new();
        let node = {
            let index =
                MetadataIndex::open(&path, DatabaseOptions::default(), IndexOptions::default())
                    .unwrap();
            index
                .create_file(CreateFile::directory(owner, "Desktop"))
                .await
                .unwrap()
        };
        let index =
            MetadataIndex::open(&path, DatabaseOptions::default(), IndexOptions::default())
                .unwrap();
        assert!(index.can_read(owner, node.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_from_memory_config() {
        let mut config = Config::default();
        config.database.path = canopy_config::MEMORY_DATABASE.to_owned();
        config.resolver.strategy = canopy_config::ResolverStrategy::StepWalk;
        let index = MetadataIndex::from_config(&config).unwrap();
        assert_eq!(index.options().strategy, AncestorStrategy::StepWalk);
        assert!(index.database().path().is_none());
    }
}
