//! Relation type registry.
//!
//! A fixed table describing every relation kind: the attribute it lives in,
//! its URL segment, its mirror kind, how many values it holds, and whether
//! the mirror uses the same attribute name. Graph operations look kinds up
//! here instead of special-casing them.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many values a relation attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Zero or one issue id
    One,
    /// A set of issue ids
    Many,
}

/// Whether a relation mirrors onto the same or a different attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    /// Mirrored onto a different attribute (e.g. `blocks` / `blockedBy`)
    Paired,
    /// Mirrored onto the same attribute (e.g. `relatedTo`)
    Symmetric,
}

/// Kind of relation between two issues.
///
/// Each variant corresponds to exactly one relation attribute on an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// Source blocks target
    Blocks,
    /// Source is blocked by target
    BlockedBy,
    /// Informational link
    RelatedTo,
    /// Source duplicates target
    DuplicateOf,
    /// Target is the parent of source
    Parent,
    /// Target is a child of source
    Children,
}

/// Registry entry for a relation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSpec {
    /// The kind this entry describes
    pub kind: RelationKind,
    /// Attribute name on the issue row
    pub attribute: &'static str,
    /// Path segment used by the HTTP and CLI surfaces
    pub segment: &'static str,
    /// Kind updated on the opposite endpoint
    pub mirror: RelationKind,
    /// Number of values held
    pub cardinality: Cardinality,
    /// Symmetry class
    pub symmetry: Symmetry,
}

/// The relation registry, indexed by `RelationKind as usize`.
pub const REGISTRY: [RelationSpec; 6] = [
    RelationSpec {
        kind: RelationKind::Blocks,
        attribute: "blocks",
        segment: "blocks",
        mirror: RelationKind::BlockedBy,
        cardinality: Cardinality::Many,
        symmetry: Symmetry::Paired,
    },
    RelationSpec {
        kind: RelationKind::BlockedBy,
        attribute: "blockedBy",
        segment: "blocked-by",
        mirror: RelationKind::Blocks,
        cardinality: Cardinality::Many,
        symmetry: Symmetry::Paired,
    },
    RelationSpec {
        kind: RelationKind::RelatedTo,
        attribute: "relatedTo",
        segment: "related-to",
        mirror: RelationKind::RelatedTo,
        cardinality: Cardinality::Many,
        symmetry: Symmetry::Symmetric,
    },
    RelationSpec {
        kind: RelationKind::DuplicateOf,
        attribute: "duplicateOf",
        segment: "duplicate-of",
        mirror: RelationKind::DuplicateOf,
        cardinality: Cardinality::Many,
        symmetry: Symmetry::Symmetric,
    },
    RelationSpec {
        kind: RelationKind::Parent,
        attribute: "parentIssue",
        segment: "parent",
        mirror: RelationKind::Children,
        cardinality: Cardinality::One,
        symmetry: Symmetry::Paired,
    },
    RelationSpec {
        kind: RelationKind::Children,
        attribute: "childrenIssues",
        segment: "children",
        mirror: RelationKind::Parent,
        cardinality: Cardinality::Many,
        symmetry: Symmetry::Paired,
    },
];

impl RelationKind {
    /// All relation kinds, in registry order.
    pub const ALL: [RelationKind; 6] = [
        RelationKind::Blocks,
        RelationKind::BlockedBy,
        RelationKind::RelatedTo,
        RelationKind::DuplicateOf,
        RelationKind::Parent,
        RelationKind::Children,
    ];

    /// Registry entry for this kind.
    pub fn spec(self) -> &'static RelationSpec {
        &REGISTRY[self as usize]
    }

    /// The kind written on the opposite endpoint.
    pub fn mirror(self) -> RelationKind {
        self.spec().mirror
    }

    /// Look a kind up by its path segment (`blocked-by`, `parent`, ...).
    pub fn from_segment(segment: &str) -> Option<RelationKind> {
        REGISTRY
            .iter()
            .find(|spec| spec.segment == segment)
            .map(|spec| spec.kind)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().segment)
    }
}

impl FromStr for RelationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationKind::from_segment(s).ok_or_else(|| Error::UnknownRelationKind(s.to_string()))
    }
}
