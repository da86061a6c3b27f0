//! Storage abstraction layer for lattice.
//!
//! The store is a dumb row accessor: get, put, and delete one issue by id.
//! There are no joins, no multi-row transactions, and no reverse index.
//! Everything relational is owned by [`crate::graph::RelationGraph`].
//!
//! Implementations:
//!
//! - **In-memory**: [`in_memory::InMemoryStore`], ephemeral rows behind a mutex
//! - **JSONL**: [`jsonl::JsonlStore`], rows persisted to a JSON Lines file on every write
//!
//! [`TimeoutStore`] wraps any backend and turns slow calls into
//! [`Error::StorageUnavailable`].
//!
//! # Single-row edits
//!
//! Relation mutations are expressed as a [`RowEdit`] applied to one row.
//! The default [`IssueStore::edit`] is a plain read-modify-write; the
//! built-in stores override it to run under their lock so that concurrent
//! edits to the same row do not lose each other's updates.
//!
//! # Test Utilities
//!
//! With the `test-util` feature, [`faulty::FaultyStore`] injects write
//! failures so partial-mutation paths can be exercised.
//!
//! # Example
//!
//! ```no_run
//! use lattice::storage::{create_store, StoreBackend};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = create_store(StoreBackend::InMemory, Duration::from_secs(5)).await?;
//!     assert!(store.scan().await?.is_empty());
//!     Ok(())
//! }
//! ```

use crate::domain::{Issue, IssueId, Linked};
use crate::error::{Error, Result};
use crate::relation::RelationKind;
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub mod in_memory;
pub mod jsonl;

#[cfg(any(test, feature = "test-util"))]
pub mod faulty;

/// A targeted change to one relation attribute of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowEdit {
    /// Add `id` to the `kind` attribute (replacing it if single-valued)
    Link {
        /// Attribute to change
        kind: RelationKind,
        /// Issue id to add
        id: IssueId,
    },

    /// Remove `id` from the `kind` attribute
    Unlink {
        /// Attribute to change
        kind: RelationKind,
        /// Issue id to remove
        id: IssueId,
    },
}

impl RowEdit {
    /// Apply the edit to an issue in place, bumping `updated_at` on change.
    pub fn apply(&self, issue: &mut Issue) -> Linked {
        let linked = match self {
            RowEdit::Link { kind, id } => issue.relations.link(*kind, id),
            RowEdit::Unlink { kind, id } => Linked {
                changed: issue.relations.unlink(*kind, id),
                displaced: None,
            },
        };
        if linked.changed {
            issue.updated_at = Utc::now();
        }
        linked
    }
}

/// Result of a successful [`IssueStore::edit`].
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// The row after the edit
    pub issue: Issue,

    /// Whether anything changed (unchanged rows are not rewritten)
    pub changed: bool,

    /// Previous value of a single-valued attribute that was replaced
    pub displaced: Option<IssueId>,
}

/// Row-level storage for issues.
///
/// Each call is atomic for its one row. Nothing spans rows.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Get an issue by ID.
    ///
    /// Returns `None` if the issue doesn't exist.
    async fn get(&self, id: &IssueId) -> Result<Option<Issue>>;

    /// Insert or replace a row.
    async fn put(&self, issue: &Issue) -> Result<()>;

    /// Delete a row. Returns whether it existed.
    async fn delete(&self, id: &IssueId) -> Result<bool>;

    /// Every row, ordered by id. Used by the consistency audit.
    async fn scan(&self) -> Result<Vec<Issue>>;

    /// Apply a single-row edit.
    ///
    /// Returns `None` if the row doesn't exist. Unchanged rows are not written.
    async fn edit(&self, id: &IssueId, edit: &RowEdit) -> Result<Option<EditOutcome>> {
        let Some(mut issue) = self.get(id).await? else {
            return Ok(None);
        };
        let linked = edit.apply(&mut issue);
        if linked.changed {
            self.put(&issue).await?;
        }
        Ok(Some(EditOutcome {
            issue,
            changed: linked.changed,
            displaced: linked.displaced,
        }))
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl(PathBuf),
}

impl StoreBackend {
    /// Returns the data file path for file-based backends.
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StoreBackend::Jsonl(path) => Some(path),
            StoreBackend::InMemory => None,
        }
    }
}

/// Wrapper that bounds every call to the inner store by a timeout.
///
/// An elapsed timeout surfaces as [`Error::StorageUnavailable`]. The call is
/// not retried. The inner future is dropped mid-flight, so backends commit
/// in-memory state only after their last await point.
pub struct TimeoutStore {
    inner: Arc<dyn IssueStore>,
    timeout: Duration,
}

impl TimeoutStore {
    /// Wrap `inner`, limiting each call to `timeout`.
    pub fn new(inner: Arc<dyn IssueStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn within<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        if let Ok(result) = tokio::time::timeout(self.timeout, fut).await {
            result
        } else {
            tracing::warn!(
                operation,
                timeout_ms = self.timeout.as_millis(),
                "Store call timed out"
            );
            Err(Error::StorageUnavailable(format!(
                "{operation} timed out after {}ms",
                self.timeout.as_millis()
            )))
        }
    }
}

#[async_trait]
impl IssueStore for TimeoutStore {
    async fn get(&self, id: &IssueId) -> Result<Option<Issue>> {
        self.within("get", self.inner.get(id)).await
    }

    async fn put(&self, issue: &Issue) -> Result<()> {
        self.within("put", self.inner.put(issue)).await
    }

    async fn delete(&self, id: &IssueId) -> Result<bool> {
        self.within("delete", self.inner.delete(id)).await
    }

    async fn scan(&self) -> Result<Vec<Issue>> {
        self.within("scan", self.inner.scan()).await
    }

    async fn edit(&self, id: &IssueId, edit: &RowEdit) -> Result<Option<EditOutcome>> {
        self.within("edit", self.inner.edit(id, edit)).await
    }
}

/// Create a store for the given backend, wrapped in a [`TimeoutStore`].
///
/// # Errors
///
/// - `Error::StorageUnavailable` if the JSONL file exists but cannot be read
pub async fn create_store(backend: StoreBackend, timeout: Duration) -> Result<Arc<dyn IssueStore>> {
    let inner: Arc<dyn IssueStore> = match backend {
        StoreBackend::InMemory => Arc::new(in_memory::InMemoryStore::new()),
        StoreBackend::Jsonl(path) => {
            let (store, warnings) = jsonl::JsonlStore::open(&path).await?;
            // Log warnings but continue - storage is still usable
            for warning in &warnings {
                tracing::warn!(warning = ?warning, "JSONL load warning");
            }
            Arc::new(store)
        }
    };
    Ok(Arc::new(TimeoutStore::new(inner, timeout)))
}
