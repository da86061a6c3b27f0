//! Fault-injecting store for tests.
//!
//! [`FaultyStore`] wraps an [`InMemoryStore`] and fails writes on demand
//! with [`Error::StorageUnavailable`], simulating a process that dies or a
//! backend that drops out between the two row writes of a relation mutation.

use super::in_memory::InMemoryStore;
use super::{EditOutcome, IssueStore, RowEdit};
use crate::domain::{Issue, IssueId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store that fails writes after a budget is spent or for chosen rows.
///
/// Reads always succeed. A write is any `put`, `delete`, or `edit` call,
/// whether or not it would change the row.
#[derive(Debug)]
pub struct FaultyStore {
    inner: InMemoryStore,
    write_budget: AtomicUsize,
    failing_rows: Mutex<HashSet<IssueId>>,
}

impl FaultyStore {
    /// Wrap `inner` with no faults armed.
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            write_budget: AtomicUsize::new(usize::MAX),
            failing_rows: Mutex::new(HashSet::new()),
        }
    }

    /// Allow `writes` more writes, then fail every write after that.
    pub fn fail_after_writes(&self, writes: usize) {
        self.write_budget.store(writes, Ordering::SeqCst);
    }

    /// Fail every write to `id`.
    pub fn fail_writes_to(&self, id: &IssueId) {
        self.rows_guard().insert(id.clone());
    }

    /// Disarm all faults.
    pub fn heal(&self) {
        self.write_budget.store(usize::MAX, Ordering::SeqCst);
        self.rows_guard().clear();
    }

    /// The wrapped store, for inspecting rows behind the faults.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn rows_guard(&self) -> std::sync::MutexGuard<'_, HashSet<IssueId>> {
        // A poisoned set is still a valid set
        self.failing_rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_write(&self, operation: &str, id: &IssueId) -> Result<()> {
        if self.rows_guard().contains(id) {
            return Err(Error::StorageUnavailable(format!(
                "injected failure: {operation} {id}"
            )));
        }
        let spent = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |budget| {
                if budget == usize::MAX {
                    Some(budget)
                } else {
                    budget.checked_sub(1)
                }
            });
        if spent.is_err() {
            return Err(Error::StorageUnavailable(format!(
                "injected failure: {operation} {id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl IssueStore for FaultyStore {
    async fn get(&self, id: &IssueId) -> Result<Option<Issue>> {
        self.inner.get(id).await
    }

    async fn put(&self, issue: &Issue) -> Result<()> {
        self.check_write("put", &issue.id)?;
        self.inner.put(issue).await
    }

    async fn delete(&self, id: &IssueId) -> Result<bool> {
        self.check_write("delete", id)?;
        self.inner.delete(id).await
    }

    async fn scan(&self) -> Result<Vec<Issue>> {
        self.inner.scan().await
    }

    async fn edit(&self, id: &IssueId, edit: &RowEdit) -> Result<Option<EditOutcome>> {
        self.check_write("edit", id)?;
        self.inner.edit(id, edit).await
    }
}
