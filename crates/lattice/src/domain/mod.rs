//! Domain types for the issue relationship graph.
//!
//! An [`Issue`] is a node stored as an independent row. Its six relation
//! attributes live in [`Relations`]; an edge only exists as a forward entry
//! on one row plus the mirrored entry on the other.

use crate::relation::{Cardinality, RelationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Maximum length for issue titles
pub const MAX_TITLE_LENGTH: usize = 200;

/// Minimum project id length
pub const MIN_PROJECT_LENGTH: usize = 2;

/// Maximum project id length
pub const MAX_PROJECT_LENGTH: usize = 20;

/// Identifier of the project (tenant) that owns an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Create a new project ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the project ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the project id is 2-20 ASCII alphanumerics.
    ///
    /// Hyphens are rejected because they separate the project from the
    /// suffix in an [`IssueId`].
    pub fn is_valid(&self) -> bool {
        (MIN_PROJECT_LENGTH..=MAX_PROJECT_LENGTH).contains(&self.0.len())
            && self.0.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for an issue, formatted as `{project}-{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueId(pub String);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the issue ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The project that owns this issue, derived from the id prefix.
    ///
    /// Returns `None` when the id is not of the form `{project}-{suffix}`;
    /// such an id can never name a stored issue.
    ///
    /// Access checks use this rather than the row's `project_id`; stores
    /// must not hold a row whose `project_id` disagrees with it.
    pub fn project(&self) -> Option<ProjectId> {
        let (prefix, suffix) = self.0.split_once('-')?;
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let project = ProjectId::new(prefix);
        project.is_valid().then_some(project)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The principal performing a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor(pub String);

impl Actor {
    /// Create a new actor
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The anonymous actor. It holds no role in any project.
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    /// Returns the actor name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<anonymous>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Status of an issue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Issue is open and ready to work on
    #[default]
    Open,

    /// Issue is currently being worked on
    InProgress,

    /// Issue has been completed
    Closed,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "open"),
            IssueStatus::InProgress => write!(f, "in_progress"),
            IssueStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Type of issue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Defect
    Bug,

    /// General task
    #[default]
    Task,

    /// Support or maintenance ticket
    Ticket,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueType::Bug => write!(f, "bug"),
            IssueType::Task => write!(f, "task"),
            IssueType::Ticket => write!(f, "ticket"),
        }
    }
}

/// Borrowed view of one relation attribute.
#[derive(Debug)]
pub enum Slot<'a> {
    /// Multi-valued attribute
    Many(&'a BTreeSet<IssueId>),
    /// Single-valued attribute
    One(&'a Option<IssueId>),
}

/// Mutable view of one relation attribute.
#[derive(Debug)]
pub enum SlotMut<'a> {
    /// Multi-valued attribute
    Many(&'a mut BTreeSet<IssueId>),
    /// Single-valued attribute
    One(&'a mut Option<IssueId>),
}

/// Result of linking an id into a relation attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Linked {
    /// Whether the attribute changed
    pub changed: bool,

    /// Previous value of a single-valued attribute that was replaced
    pub displaced: Option<IssueId>,
}

/// The six relation attributes carried by every issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Relations {
    /// Issues this issue blocks
    pub blocks: BTreeSet<IssueId>,

    /// Issues blocking this issue
    pub blocked_by: BTreeSet<IssueId>,

    /// Loosely related issues
    pub related_to: BTreeSet<IssueId>,

    /// Issues this issue duplicates (kept symmetric)
    pub duplicate_of: BTreeSet<IssueId>,

    /// Parent issue, if any
    pub parent_issue: Option<IssueId>,

    /// Child issues
    pub children_issues: BTreeSet<IssueId>,
}

impl Relations {
    /// The attribute backing `kind`.
    ///
    /// This is the only place that maps relation kinds onto fields.
    pub fn slot(&self, kind: RelationKind) -> Slot<'_> {
        match kind {
            RelationKind::Blocks => Slot::Many(&self.blocks),
            RelationKind::BlockedBy => Slot::Many(&self.blocked_by),
            RelationKind::RelatedTo => Slot::Many(&self.related_to),
            RelationKind::DuplicateOf => Slot::Many(&self.duplicate_of),
            RelationKind::Parent => Slot::One(&self.parent_issue),
            RelationKind::Children => Slot::Many(&self.children_issues),
        }
    }

    /// Mutable access to the attribute backing `kind`.
    pub fn slot_mut(&mut self, kind: RelationKind) -> SlotMut<'_> {
        match kind {
            RelationKind::Blocks => SlotMut::Many(&mut self.blocks),
            RelationKind::BlockedBy => SlotMut::Many(&mut self.blocked_by),
            RelationKind::RelatedTo => SlotMut::Many(&mut self.related_to),
            RelationKind::DuplicateOf => SlotMut::Many(&mut self.duplicate_of),
            RelationKind::Parent => SlotMut::One(&mut self.parent_issue),
            RelationKind::Children => SlotMut::Many(&mut self.children_issues),
        }
    }

    /// Check whether `id` is present in the `kind` attribute.
    pub fn contains(&self, kind: RelationKind, id: &IssueId) -> bool {
        match self.slot(kind) {
            Slot::Many(set) => set.contains(id),
            Slot::One(value) => value.as_ref() == Some(id),
        }
    }

    /// Add `id` to the `kind` attribute.
    ///
    /// Sets use union semantics. A single-valued attribute is replaced and
    /// the previous value is reported as displaced.
    pub fn link(&mut self, kind: RelationKind, id: &IssueId) -> Linked {
        debug_assert_eq!(
            matches!(self.slot(kind), Slot::One(_)),
            kind.spec().cardinality == Cardinality::One
        );
        match self.slot_mut(kind) {
            SlotMut::Many(set) => Linked {
                changed: set.insert(id.clone()),
                displaced: None,
            },
            SlotMut::One(value) => {
                if value.as_ref() == Some(id) {
                    return Linked::default();
                }
                Linked {
                    changed: true,
                    displaced: value.replace(id.clone()),
                }
            }
        }
    }

    /// Remove `id` from the `kind` attribute.
    ///
    /// A single-valued attribute is cleared only when it currently holds `id`.
    pub fn unlink(&mut self, kind: RelationKind, id: &IssueId) -> bool {
        match self.slot_mut(kind) {
            SlotMut::Many(set) => set.remove(id),
            SlotMut::One(value) => {
                if value.as_ref() == Some(id) {
                    *value = None;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Ids currently held in the `kind` attribute.
    pub fn neighbors(&self, kind: RelationKind) -> Vec<IssueId> {
        match self.slot(kind) {
            Slot::Many(set) => set.iter().cloned().collect(),
            Slot::One(value) => value.iter().cloned().collect(),
        }
    }

    /// Every `(kind, neighbor)` pair on this row, in registry order.
    pub fn edges(&self) -> Vec<(RelationKind, IssueId)> {
        RelationKind::ALL
            .iter()
            .flat_map(|&kind| self.neighbors(kind).into_iter().map(move |id| (kind, id)))
            .collect()
    }

    /// Total number of outgoing entries across all attributes.
    pub fn degree(&self) -> usize {
        RelationKind::ALL
            .iter()
            .map(|&kind| match self.slot(kind) {
                Slot::Many(set) => set.len(),
                Slot::One(value) => usize::from(value.is_some()),
            })
            .sum()
    }

    /// True when no relation attribute holds a value.
    pub fn is_empty(&self) -> bool {
        self.degree() == 0
    }
}

/// Represents an issue row in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique identifier for the issue
    pub id: IssueId,

    /// Owning project (partition key)
    pub project_id: ProjectId,

    /// Issue title
    pub title: String,

    /// Issue description
    #[serde(default)]
    pub description: String,

    /// Current status
    #[serde(default)]
    pub status: IssueStatus,

    /// Issue type
    #[serde(default)]
    pub issue_type: IssueType,

    /// Relation attributes
    #[serde(flatten)]
    pub relations: Relations,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Snapshot of this issue's relation attributes.
    pub fn snapshot(&self) -> RelationSnapshot {
        RelationSnapshot {
            id: self.id.clone(),
            relations: self.relations.clone(),
        }
    }
}

/// The relation attributes of one issue, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationSnapshot {
    /// Issue the snapshot was taken from
    pub id: IssueId,

    /// Relation attributes
    #[serde(flatten)]
    pub relations: Relations,
}

/// Data for creating a new issue
#[derive(Debug, Clone)]
pub struct NewIssue {
    /// Owning project
    pub project_id: ProjectId,

    /// Issue title
    pub title: String,

    /// Issue description
    pub description: String,

    /// Issue type
    pub issue_type: IssueType,
}

impl NewIssue {
    /// Validate the new issue data.
    ///
    /// # Errors
    ///
    /// Returns a description of the first failed check.
    pub fn validate(&self) -> Result<(), String> {
        if !self.project_id.is_valid() {
            return Err(format!(
                "Project id '{}' must be {MIN_PROJECT_LENGTH}-{MAX_PROJECT_LENGTH} alphanumeric characters",
                self.project_id
            ));
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title cannot be empty".to_string());
        }
        if title.len() > MAX_TITLE_LENGTH {
            return Err(format!(
                "Title cannot exceed {MAX_TITLE_LENGTH} characters, got {}",
                title.len()
            ));
        }
        Ok(())
    }
}
