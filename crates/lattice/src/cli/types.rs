//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::IssueType;
use crate::relation::RelationKind;

/// Issue type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueTypeArg {
    /// Defect
    Bug,
    /// General task
    Task,
    /// Support or maintenance ticket
    Ticket,
}

impl From<IssueTypeArg> for IssueType {
    fn from(arg: IssueTypeArg) -> Self {
        match arg {
            IssueTypeArg::Bug => IssueType::Bug,
            IssueTypeArg::Task => IssueType::Task,
            IssueTypeArg::Ticket => IssueType::Ticket,
        }
    }
}

/// Relation kind for CLI arguments, named like the HTTP path segments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKindArg {
    /// Source blocks target
    Blocks,
    /// Source is blocked by target
    BlockedBy,
    /// Informational link (symmetric)
    RelatedTo,
    /// Source duplicates target (symmetric)
    DuplicateOf,
    /// Target becomes the parent of source
    Parent,
    /// Target becomes a child of source
    Children,
}

impl From<RelationKindArg> for RelationKind {
    fn from(arg: RelationKindArg) -> Self {
        match arg {
            RelationKindArg::Blocks => RelationKind::Blocks,
            RelationKindArg::BlockedBy => RelationKind::BlockedBy,
            RelationKindArg::RelatedTo => RelationKind::RelatedTo,
            RelationKindArg::DuplicateOf => RelationKind::DuplicateOf,
            RelationKindArg::Parent => RelationKind::Parent,
            RelationKindArg::Children => RelationKind::Children,
        }
    }
}
