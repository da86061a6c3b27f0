//! Mirror consistency audit.

use crate::domain::{Issue, IssueId};
use crate::relation::RelationKind;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A single inconsistency found by [`audit_rows`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum Finding {
    /// `issue` lists `target` under `kind`, but `target` lacks the mirror entry
    OneSided {
        /// Row holding the entry
        issue: IssueId,
        /// Attribute the entry sits under
        kind: RelationKind,
        /// Row missing the mirror
        target: IssueId,
    },

    /// `issue` lists `target` under `kind`, but no row `target` exists
    Dangling {
        /// Row holding the entry
        issue: IssueId,
        /// Attribute the entry sits under
        kind: RelationKind,
        /// Id with no stored row
        target: IssueId,
    },

    /// `issue` lists itself under `kind`
    SelfReference {
        /// Row holding the entry
        issue: IssueId,
        /// Attribute the entry sits under
        kind: RelationKind,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::OneSided {
                issue,
                kind,
                target,
            } => write!(
                f,
                "{issue} {kind} {target}, but {target} has no {} entry for {issue}",
                kind.mirror()
            ),
            Finding::Dangling {
                issue,
                kind,
                target,
            } => write!(f, "{issue} {kind} {target}, but {target} does not exist"),
            Finding::SelfReference { issue, kind } => {
                write!(f, "{issue} lists itself under {kind}")
            }
        }
    }
}

/// Result of auditing the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Rows read from the store
    pub issues_scanned: usize,
    /// Relation entries examined across all rows
    pub edges_checked: usize,
    /// Problems found, in row order
    pub findings: Vec<Finding>,
}

impl AuditReport {
    /// True if every edge has its mirror.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Check every relation entry in `rows` against its mirror.
pub fn audit_rows(rows: &[Issue]) -> AuditReport {
    let index: HashMap<&IssueId, &Issue> = rows.iter().map(|issue| (&issue.id, issue)).collect();
    let mut report = AuditReport {
        issues_scanned: rows.len(),
        ..AuditReport::default()
    };

    for issue in rows {
        for (kind, target) in issue.relations.edges() {
            report.edges_checked += 1;
            if target == issue.id {
                report.findings.push(Finding::SelfReference {
                    issue: issue.id.clone(),
                    kind,
                });
                continue;
            }
            match index.get(&target) {
                None => report.findings.push(Finding::Dangling {
                    issue: issue.id.clone(),
                    kind,
                    target,
                }),
                Some(other) if !other.relations.contains(kind.mirror(), &issue.id) => {
                    report.findings.push(Finding::OneSided {
                        issue: issue.id.clone(),
                        kind,
                        target,
                    });
                }
                Some(_) => {}
            }
        }
    }

    report
}
