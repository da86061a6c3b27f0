//! JSONL-backed storage.
//!
//! All rows are held in memory and the whole file is rewritten after every
//! mutating call, using the temp-file-then-rename pattern so a crash never
//! leaves a half-written file behind. Each call is therefore durable and
//! atomic for its one row, which is all the graph service relies on.
//!
//! Loading is resilient: malformed lines are skipped and reported as
//! [`LoadWarning`]s instead of failing the whole load. So are rows whose
//! `projectId` disagrees with their id prefix; the prefix is what access
//! checks are made against.
//!
//! Every write builds the next set of rows, persists it, and only then
//! swaps it into memory. A call that fails or is cancelled mid-write
//! leaves memory untouched. If it is cancelled after the blocking rename
//! has already been handed off, the file can hold that row until the next
//! write rewrites it from memory.

use super::{EditOutcome, IssueStore, RowEdit};
use crate::domain::{Issue, IssueId, ProjectId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Non-fatal problems found while loading a JSONL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line that couldn't be parsed as an issue
    ///
    /// **Effect**: Line is skipped entirely.
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// The same id appears on more than one line
    ///
    /// **Effect**: The later line wins.
    DuplicateId {
        /// Duplicated issue id
        issue_id: IssueId,
        /// 1-based line number of the later occurrence
        line_number: usize,
    },

    /// The row's `projectId` is not the project named by its id prefix
    ///
    /// **Effect**: Line is skipped entirely.
    ProjectMismatch {
        /// Issue id from the line
        issue_id: IssueId,
        /// Project recorded on the row
        project_id: ProjectId,
        /// 1-based line number
        line_number: usize,
    },
}

/// Row store persisted to a JSON Lines file.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    rows: Mutex<HashMap<IssueId, Issue>>,
}

impl JsonlStore {
    /// Open the store at `path`, loading any existing rows.
    ///
    /// A missing file is treated as an empty store; it is created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageUnavailable` if the file exists but cannot be read.
    pub async fn open(path: &Path) -> Result<(Self, Vec<LoadWarning>)> {
        let (rows, warnings) = match fs::read_to_string(path).await {
            Ok(content) => parse_rows(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (HashMap::new(), Vec::new()),
            Err(e) => return Err(unavailable("read", path, &e)),
        };
        tracing::debug!(
            path = %path.display(),
            rows = rows.len(),
            warnings = warnings.len(),
            "Loaded JSONL store"
        );
        Ok((
            Self {
                path: path.to_path_buf(),
                rows: Mutex::new(rows),
            },
            warnings,
        ))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every row to disk atomically.
    async fn persist(&self, rows: &HashMap<IssueId, Issue>) -> Result<()> {
        let mut sorted: Vec<&Issue> = rows.values().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        let mut buffer = String::new();
        for issue in sorted {
            let line = serde_json::to_string(issue)
                .map_err(|e| Error::StorageUnavailable(format!("serialize {}: {e}", issue.id)))?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let temp_path = self.path.with_extension("jsonl.tmp");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| unavailable("create directory", parent, &e))?;
        }
        fs::write(&temp_path, buffer)
            .await
            .map_err(|e| unavailable("write", &temp_path, &e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| unavailable("rename", &self.path, &e))?;
        Ok(())
    }
}

fn unavailable(operation: &str, path: &Path, error: &io::Error) -> Error {
    Error::StorageUnavailable(format!("{operation} {}: {error}", path.display()))
}

fn parse_rows(content: &str) -> (HashMap<IssueId, Issue>, Vec<LoadWarning>) {
    let mut rows = HashMap::new();
    let mut warnings = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Issue>(line) {
            Ok(issue) if issue.id.project().as_ref() != Some(&issue.project_id) => {
                warnings.push(LoadWarning::ProjectMismatch {
                    issue_id: issue.id,
                    project_id: issue.project_id,
                    line_number,
                });
            }
            Ok(issue) => {
                let id = issue.id.clone();
                if rows.insert(id.clone(), issue).is_some() {
                    warnings.push(LoadWarning::DuplicateId {
                        issue_id: id,
                        line_number,
                    });
                }
            }
            Err(e) => warnings.push(LoadWarning::MalformedJson {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    (rows, warnings)
}

#[async_trait]
impl IssueStore for JsonlStore {
    async fn get(&self, id: &IssueId) -> Result<Option<Issue>> {
        Ok(self.rows.lock().await.get(id).cloned())
    }

    async fn put(&self, issue: &Issue) -> Result<()> {
        let mut rows = self.rows.lock().await;
        let mut next = rows.clone();
        next.insert(issue.id.clone(), issue.clone());
        self.persist(&next).await?;
        *rows = next;
        Ok(())
    }

    async fn delete(&self, id: &IssueId) -> Result<bool> {
        let mut rows = self.rows.lock().await;
        if !rows.contains_key(id) {
            return Ok(false);
        }
        let mut next = rows.clone();
        next.remove(id);
        self.persist(&next).await?;
        *rows = next;
        Ok(true)
    }

    async fn scan(&self) -> Result<Vec<Issue>> {
        let rows = self.rows.lock().await;
        let mut issues: Vec<Issue> = rows.values().cloned().collect();
        issues.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(issues)
    }

    async fn edit(&self, id: &IssueId, edit: &RowEdit) -> Result<Option<EditOutcome>> {
        let mut rows = self.rows.lock().await;
        let Some(current) = rows.get(id) else {
            return Ok(None);
        };
        let mut updated = current.clone();
        let linked = edit.apply(&mut updated);
        if linked.changed {
            let mut next = rows.clone();
            next.insert(id.clone(), updated.clone());
            self.persist(&next).await?;
            *rows = next;
        }
        Ok(Some(EditOutcome {
            issue: updated,
            changed: linked.changed,
            displaced: linked.displaced,
        }))
    }
}
