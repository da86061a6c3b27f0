//! Relation graph service.
//!
//! Owns every invariant of the issue graph on top of a row store that offers
//! no cross-row transactions. Each relation mutation touches more than one
//! row, so the writes are ordered and every call is safe to repeat: if a
//! store call fails partway, re-issuing the same call finishes the job.
//!
//! | Operation | Writes | Left behind by an interruption |
//! |---|---|---|
//! | `add_relation` | release of a displaced parent, then mirror on target, forward on source | a child still naming the parent that dropped it, or a stray mirror on the target |
//! | `remove_relation` | mirror on target, forward on source | a forward entry on the source whose mirror is gone |
//! | `delete_issue` | one unlink per neighbour, then the row itself | the row, still listing already-scrubbed neighbours |
//!
//! An add or remove issued from the endpoint that still holds the entry
//! repairs a half-written pair just as well. Nothing is rolled back and
//! nothing is retried here.

mod audit;

pub use audit::{AuditReport, Finding, audit_rows};

use crate::access::{AccessGuard, Capability};
use crate::domain::{
    Actor, Issue, IssueId, IssueStatus, NewIssue, ProjectId, RelationSnapshot, Relations,
};
use crate::error::{Error, Result};
use crate::id_generation::IdGenerator;
use crate::relation::RelationKind;
use crate::storage::{IssueStore, RowEdit};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary of a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Relation entries found on the deleted row
    pub edges: usize,

    /// Neighbour attributes that actually changed
    pub references_removed: usize,
}

/// The relation graph service.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct RelationGraph {
    store: Arc<dyn IssueStore>,
    guard: Arc<dyn AccessGuard>,
}

impl std::fmt::Debug for RelationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationGraph")
            .field("store", &"<dyn IssueStore>")
            .field("guard", &"<dyn AccessGuard>")
            .finish()
    }
}

impl RelationGraph {
    /// Create a service over `store`, authorizing through `guard`.
    pub fn new(store: Arc<dyn IssueStore>, guard: Arc<dyn AccessGuard>) -> Self {
        Self { store, guard }
    }

    /// The underlying row store.
    pub fn store(&self) -> &dyn IssueStore {
        self.store.as_ref()
    }

    // ========== Reads (not gated) ==========

    /// Get an issue row by id.
    ///
    /// # Errors
    ///
    /// - `Error::StorageUnavailable` if the store fails
    pub async fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>> {
        self.store.get(id).await
    }

    /// The relation attributes of an issue.
    ///
    /// # Errors
    ///
    /// - `Error::IssueNotFound` if the issue doesn't exist
    pub async fn relations(&self, id: &IssueId) -> Result<RelationSnapshot> {
        Ok(self.require(id).await?.snapshot())
    }

    // ========== Mutations ==========

    /// Create an issue with empty relations.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` if the title or project id is invalid
    /// - `Error::PermissionDenied` if the actor cannot edit issues in the project
    pub async fn create_issue(&self, new_issue: NewIssue, actor: &Actor) -> Result<Issue> {
        new_issue.validate().map_err(Error::Validation)?;
        self.authorize(actor, &new_issue.project_id, Capability::EditIssues)
            .await?;

        let generator = IdGenerator::new(
            new_issue.project_id.clone(),
            &new_issue.title,
            actor.as_str(),
        );
        let mut chosen = None;
        for candidate in generator.candidates() {
            if self.store.get(&candidate).await?.is_none() {
                chosen = Some(candidate);
                break;
            }
            debug!(candidate = %candidate, "Issue id collision, trying next candidate");
        }
        let id = chosen.ok_or_else(|| {
            Error::StorageUnavailable("ID generation failed: every candidate is taken".to_string())
        })?;

        let now = Utc::now();
        let issue = Issue {
            id,
            project_id: new_issue.project_id,
            title: new_issue.title.trim().to_string(),
            description: new_issue.description,
            status: IssueStatus::Open,
            issue_type: new_issue.issue_type,
            relations: Relations::default(),
            created_at: now,
            updated_at: now,
        };
        self.store.put(&issue).await?;
        info!(issue = %issue.id, project = %issue.project_id, %actor, "Issue created");
        Ok(issue)
    }

    /// Relate `source` to `target` with `kind`, mirroring onto `target`.
    ///
    /// Idempotent: repeating the call leaves the same state. Setting a new
    /// parent (directly, or by adopting a child) detaches the child from its
    /// previous parent.
    ///
    /// # Errors
    ///
    /// - `Error::SelfRelation` if `source == target` (checked before anything else)
    /// - `Error::PermissionDenied` if the actor cannot edit issues in `source`'s project
    /// - `Error::IssueNotFound` if either issue is missing (nothing is written)
    /// - `Error::StorageUnavailable` if a store call fails; earlier writes stay in place
    pub async fn add_relation(
        &self,
        source: &IssueId,
        kind: RelationKind,
        target: &IssueId,
        actor: &Actor,
    ) -> Result<RelationSnapshot> {
        if source == target {
            return Err(Error::SelfRelation {
                issue: source.clone(),
                kind,
            });
        }
        self.authorize_issue(actor, source, Capability::EditIssues)
            .await?;
        let source_row = self.require(source).await?;
        let target_row = self.require(target).await?;

        // Detach from the old parent while the child still names it, so an
        // interrupted call is finished by repeating it
        let released = match kind {
            RelationKind::Parent => displaced_parent(&source_row, target),
            RelationKind::Children => displaced_parent(&target_row, source),
            _ => None,
        };
        if let Some((holder, previous)) = &released {
            self.release_displaced(holder, previous).await?;
        }

        let mirror = self
            .store
            .edit(
                target,
                &RowEdit::Link {
                    kind: kind.mirror(),
                    id: source.clone(),
                },
            )
            .await?
            .ok_or_else(|| Error::IssueNotFound(target.clone()))?;

        let forward = self
            .store
            .edit(
                source,
                &RowEdit::Link {
                    kind,
                    id: target.clone(),
                },
            )
            .await?
            .ok_or_else(|| Error::IssueNotFound(source.clone()))?;

        // A parent set by a concurrent caller since the rows were read
        for (holder, displaced) in [(target, mirror.displaced), (source, forward.displaced)] {
            let Some(previous) = displaced else { continue };
            if released.as_ref().map(|(_, p)| p) != Some(&previous) {
                self.release_displaced(holder, &previous).await?;
            }
        }

        info!(
            source = %source,
            %kind,
            target = %target,
            %actor,
            changed = forward.changed || mirror.changed,
            "Relation added"
        );
        Ok(forward.issue.snapshot())
    }

    /// Remove the `kind` relation from `source` to `target` on both sides.
    ///
    /// If the target row no longer exists, only the source side is cleared.
    ///
    /// # Errors
    ///
    /// - `Error::SelfRelation` if `source == target`
    /// - `Error::PermissionDenied` if the actor cannot edit issues in `source`'s project
    /// - `Error::IssueNotFound` if `source` is missing
    /// - `Error::RelationNotFound` if `source` does not hold `target` under `kind`;
    ///   on a retry path this means "already removed"
    pub async fn remove_relation(
        &self,
        source: &IssueId,
        kind: RelationKind,
        target: &IssueId,
        actor: &Actor,
    ) -> Result<()> {
        if source == target {
            return Err(Error::SelfRelation {
                issue: source.clone(),
                kind,
            });
        }
        self.authorize_issue(actor, source, Capability::EditIssues)
            .await?;
        let row = self.require(source).await?;
        if !row.relations.contains(kind, target) {
            return Err(Error::RelationNotFound {
                issue: source.clone(),
                kind,
                target: target.clone(),
            });
        }

        let mirror = self
            .store
            .edit(
                target,
                &RowEdit::Unlink {
                    kind: kind.mirror(),
                    id: source.clone(),
                },
            )
            .await?;
        if mirror.is_none() {
            warn!(
                source = %source,
                %kind,
                target = %target,
                "Target row missing, clearing dangling reference on source only"
            );
        }

        self.store
            .edit(
                source,
                &RowEdit::Unlink {
                    kind,
                    id: target.clone(),
                },
            )
            .await?
            .ok_or_else(|| Error::IssueNotFound(source.clone()))?;

        info!(source = %source, %kind, target = %target, %actor, "Relation removed");
        Ok(())
    }

    /// Delete an issue after scrubbing it from every neighbour it lists.
    ///
    /// Cost is proportional to the issue's degree. If a neighbour update
    /// fails, the row is kept so a retry can finish the cleanup. An issue
    /// that is already gone counts as deleted: the call succeeds with an
    /// empty report, so a repeated delete is harmless.
    ///
    /// # Errors
    ///
    /// - `Error::PermissionDenied` if the actor cannot delete issues in the project
    /// - `Error::IssueNotFound` if the id carries no project prefix
    /// - `Error::StorageUnavailable` if a store call fails
    pub async fn delete_issue(&self, id: &IssueId, actor: &Actor) -> Result<DeleteReport> {
        self.authorize_issue(actor, id, Capability::DeleteIssues)
            .await?;
        let Some(row) = self.store.get(id).await? else {
            debug!(issue = %id, %actor, "Issue already deleted");
            return Ok(DeleteReport::default());
        };

        let mut report = DeleteReport::default();
        for (kind, neighbor) in row.relations.edges() {
            report.edges += 1;
            if neighbor == *id {
                continue;
            }
            let outcome = self
                .store
                .edit(
                    &neighbor,
                    &RowEdit::Unlink {
                        kind: kind.mirror(),
                        id: id.clone(),
                    },
                )
                .await?;
            match outcome {
                Some(outcome) if outcome.changed => report.references_removed += 1,
                Some(_) => {}
                None => debug!(issue = %id, neighbor = %neighbor, "Neighbour already gone"),
            }
        }

        self.store.delete(id).await?;
        info!(
            issue = %id,
            %actor,
            edges = report.edges,
            references_removed = report.references_removed,
            "Issue deleted"
        );
        Ok(report)
    }

    // ========== Consistency ==========

    /// Scan every row and report one-sided, dangling, and self references.
    ///
    /// Read-only; a finding is repaired by re-issuing an add or remove on the
    /// endpoint that holds the entry.
    ///
    /// # Errors
    ///
    /// - `Error::StorageUnavailable` if the scan fails
    pub async fn audit(&self) -> Result<AuditReport> {
        let rows = self.store.scan().await?;
        let report = audit_rows(&rows);
        if report.is_clean() {
            debug!(issues = report.issues_scanned, "Audit clean");
        } else {
            warn!(
                issues = report.issues_scanned,
                findings = report.findings.len(),
                "Audit found inconsistent relations"
            );
        }
        Ok(report)
    }

    // ========== Helpers ==========

    async fn require(&self, id: &IssueId) -> Result<Issue> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::IssueNotFound(id.clone()))
    }

    /// Authorize against the project encoded in `id`.
    ///
    /// An id without a project prefix cannot exist, so it is reported as
    /// not found without consulting the guard.
    async fn authorize_issue(
        &self,
        actor: &Actor,
        id: &IssueId,
        capability: Capability,
    ) -> Result<()> {
        let project = id.project().ok_or_else(|| Error::IssueNotFound(id.clone()))?;
        self.authorize(actor, &project, capability).await
    }

    async fn authorize(
        &self,
        actor: &Actor,
        project: &ProjectId,
        capability: Capability,
    ) -> Result<()> {
        if self.guard.is_authorized(actor, project, capability).await {
            Ok(())
        } else {
            warn!(%actor, %project, %capability, "Permission denied");
            Err(Error::PermissionDenied {
                actor: actor.clone(),
                project: project.clone(),
                capability,
            })
        }
    }

    /// Drop `holder` from the children of `previous`, the parent it is
    /// moving away from.
    async fn release_displaced(&self, holder: &IssueId, previous: &IssueId) -> Result<()> {
        let outcome = self
            .store
            .edit(
                previous,
                &RowEdit::Unlink {
                    kind: RelationKind::Children,
                    id: holder.clone(),
                },
            )
            .await?;
        debug!(
            holder = %holder,
            previous = %previous,
            found = outcome.is_some(),
            "Released displaced parent"
        );
        Ok(())
    }
}

/// The parent `child` will lose when `new_parent` is set, with the child's id.
fn displaced_parent(child: &Issue, new_parent: &IssueId) -> Option<(IssueId, IssueId)> {
    child
        .relations
        .parent_issue
        .as_ref()
        .filter(|previous| *previous != new_parent)
        .map(|previous| (child.id.clone(), previous.clone()))
}
