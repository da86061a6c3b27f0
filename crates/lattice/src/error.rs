//! Error types for lattice operations.

use crate::access::Capability;
use crate::domain::{Actor, IssueId, ProjectId};
use crate::relation::RelationKind;
use std::io;
use thiserror::Error;

/// The error type for lattice operations.
///
/// None of these are retried internally. Only [`Error::StorageUnavailable`]
/// is worth retrying, and that decision belongs to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Issue not found (or the id can never name an issue).
    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    /// Source and target of a relation are the same issue.
    #[error("Issue {issue} cannot have a {kind} relation to itself")]
    SelfRelation {
        /// The issue
        issue: IssueId,
        /// Requested relation kind
        kind: RelationKind,
    },

    /// The relation to remove does not exist on the source issue.
    #[error("Relation not found: {issue} {kind} {target}")]
    RelationNotFound {
        /// Source issue
        issue: IssueId,
        /// Relation kind
        kind: RelationKind,
        /// Target issue
        target: IssueId,
    },

    /// The actor lacks the required capability on the owning project.
    #[error("Permission denied: {actor} cannot {capability} in project {project}")]
    PermissionDenied {
        /// Acting principal
        actor: Actor,
        /// Project the issue belongs to
        project: ProjectId,
        /// Capability that was required
        capability: Capability,
    },

    /// The store failed or timed out.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Unrecognized relation kind name.
    #[error("Unknown relation kind: {0}")]
    UnknownRelationKind(String),

    /// Invalid input for a new issue.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether a caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }
}

/// A specialized Result type for lattice operations.
pub type Result<T> = std::result::Result<T, Error>;
