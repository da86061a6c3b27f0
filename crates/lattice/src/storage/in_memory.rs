//! In-memory storage backend.
//!
//! Rows live in a `HashMap` behind a tokio `Mutex` and are **lost when the
//! process exits**. Suitable for tests, demos, and short-lived servers.
//!
//! The store is cheaply cloneable; clones share the same rows, which lets
//! tests hand one clone to the graph service and inspect rows through another.

use super::{EditOutcome, IssueStore, RowEdit};
use crate::domain::{Issue, IssueId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe in-memory row store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<Mutex<HashMap<IssueId, Issue>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `issues`.
    pub fn with_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let rows = issues
            .into_iter()
            .map(|issue| (issue.id.clone(), issue))
            .collect();
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// True if no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl IssueStore for InMemoryStore {
    async fn get(&self, id: &IssueId) -> Result<Option<Issue>> {
        Ok(self.rows.lock().await.get(id).cloned())
    }

    async fn put(&self, issue: &Issue) -> Result<()> {
        self.rows
            .lock()
            .await
            .insert(issue.id.clone(), issue.clone());
        Ok(())
    }

    async fn delete(&self, id: &IssueId) -> Result<bool> {
        Ok(self.rows.lock().await.remove(id).is_some())
    }

    async fn scan(&self) -> Result<Vec<Issue>> {
        let rows = self.rows.lock().await;
        let mut issues: Vec<Issue> = rows.values().cloned().collect();
        issues.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(issues)
    }

    async fn edit(&self, id: &IssueId, edit: &RowEdit) -> Result<Option<EditOutcome>> {
        let mut rows = self.rows.lock().await;
        let Some(issue) = rows.get_mut(id) else {
            return Ok(None);
        };
        let linked = edit.apply(issue);
        Ok(Some(EditOutcome {
            issue: issue.clone(),
            changed: linked.changed,
            displaced: linked.displaced,
        }))
    }
}
