//! Output formatting for CLI commands.
//!
//! Every printer has a text form (colored, for people) and a JSON form (for
//! scripts). Text printers write to any `Write` so tests can capture them.

use crate::domain::{Issue, IssueId, IssueStatus, IssueType, RelationSnapshot, Slot};
use crate::graph::{AuditReport, DeleteReport};
use crate::relation::{REGISTRY, RelationKind};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Color Helpers
// ============================================================================

fn colorize_status(status: IssueStatus) -> String {
    let text = status.to_string();
    match status {
        IssueStatus::Open => text.white().to_string(),
        IssueStatus::InProgress => text.yellow().to_string(),
        IssueStatus::Closed => text.green().to_string(),
    }
}

fn colorize_id(id: &IssueId) -> String {
    id.as_str().cyan().to_string()
}

fn type_icon(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::Task => "◇",
        IssueType::Bug => "●",
        IssueType::Ticket => "▣",
    }
}

// ============================================================================
// Public Printers
// ============================================================================

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

/// Print an issue with its relations
pub fn print_issue_details(issue: &Issue, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => write_issue_details(&mut handle, issue),
        OutputMode::Json => write_json(&mut handle, issue),
    }
}

/// Print the relations of one issue
pub fn print_snapshot(snapshot: &RelationSnapshot, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => {
            writeln!(handle, "{}", colorize_id(&snapshot.id))?;
            write_relations(&mut handle, snapshot)
        }
        OutputMode::Json => write_json(&mut handle, snapshot),
    }
}

/// Print the result of a cascading delete
pub fn print_delete_report(id: &IssueId, report: &DeleteReport, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "deleted": id,
            "edges": report.edges,
            "referencesRemoved": report.references_removed,
        })),
        OutputMode::Text => print_message(&format!(
            "Deleted {} ({} relation(s), {} neighbour reference(s) removed)",
            colorize_id(id),
            report.edges,
            report.references_removed
        )),
    }
}

/// Print an audit report
pub fn print_audit(report: &AuditReport, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => write_audit(&mut handle, report),
        OutputMode::Json => write_json(&mut handle, report),
    }
}

// ============================================================================
// Writers
// ============================================================================

fn write_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

fn write_issue_details<W: Write>(w: &mut W, issue: &Issue) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {}",
        colorize_id(&issue.id),
        type_icon(issue.issue_type),
        issue.title.bold()
    )?;
    writeln!(w, "  {} {}", "Status:".dimmed(), colorize_status(issue.status))?;
    writeln!(w, "  {} {}", "Project:".dimmed(), issue.project_id)?;
    writeln!(
        w,
        "  {} {}",
        "Updated:".dimmed(),
        issue.updated_at.format("%Y-%m-%d %H:%M")
    )?;
    if !issue.description.is_empty() {
        writeln!(w)?;
        for line in issue.description.lines() {
            writeln!(w, "  {line}")?;
        }
    }
    writeln!(w)?;
    write_relations(w, &issue.snapshot())
}

fn write_relations<W: Write>(w: &mut W, snapshot: &RelationSnapshot) -> io::Result<()> {
    if snapshot.relations.is_empty() {
        return writeln!(w, "  {}", "No relations".dimmed());
    }
    for spec in &REGISTRY {
        let ids: Vec<&IssueId> = match snapshot.relations.slot(spec.kind) {
            Slot::Many(set) => set.iter().collect(),
            Slot::One(value) => value.iter().collect(),
        };
        if ids.is_empty() {
            continue;
        }
        let rendered: Vec<String> = ids.into_iter().map(colorize_id).collect();
        writeln!(
            w,
            "  {:<14} {}",
            format!("{}:", relation_label(spec.kind)).dimmed(),
            rendered.join(", ")
        )?;
    }
    Ok(())
}

fn relation_label(kind: RelationKind) -> &'static str {
    match kind {
        RelationKind::Blocks => "Blocks",
        RelationKind::BlockedBy => "Blocked by",
        RelationKind::RelatedTo => "Related to",
        RelationKind::DuplicateOf => "Duplicate of",
        RelationKind::Parent => "Parent",
        RelationKind::Children => "Children",
    }
}

fn write_audit<W: Write>(w: &mut W, report: &AuditReport) -> io::Result<()> {
    writeln!(
        w,
        "Checked {} relation(s) across {} issue(s)",
        report.edges_checked, report.issues_scanned
    )?;
    if report.is_clean() {
        return writeln!(w, "{}", "✓ All relations are mirrored".green());
    }
    writeln!(
        w,
        "{}",
        format!("✗ {} problem(s) found", report.findings.len()).red()
    )?;
    for finding in &report.findings {
        writeln!(w, "  - {finding}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProjectId, Relations};
    use crate::graph::Finding;
    use chrono::Utc;

    fn plain() {
        colored::control::set_override(false);
    }

    fn test_issue() -> Issue {
        let now = Utc::now();
        let mut relations = Relations::default();
        relations.link(RelationKind::BlockedBy, &IssueId::new("proj-b"));
        relations.link(RelationKind::Parent, &IssueId::new("proj-p"));
        Issue {
            id: IssueId::new("proj-a"),
            project_id: ProjectId::from("proj"),
            title: "Fix the thing".to_string(),
            description: "Line one\nLine two".to_string(),
            status: IssueStatus::InProgress,
            issue_type: IssueType::Bug,
            relations,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_details_text() {
        plain();
        let mut buffer = Vec::new();
        write_issue_details(&mut buffer, &test_issue()).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("proj-a"));
        assert!(output.contains("Fix the thing"));
        assert!(output.contains("in_progress"));
        assert!(output.contains("  Line two"));
        assert!(output.contains("Blocked by:"));
        assert!(output.contains("Parent:"));
        assert!(!output.contains("Children:"));
    }

    #[test]
    fn test_empty_relations_text() {
        plain();
        let mut buffer = Vec::new();
        let snapshot = RelationSnapshot {
            id: IssueId::new("proj-a"),
            relations: Relations::default(),
        };
        write_relations(&mut buffer, &snapshot).unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("No relations"));
    }

    #[test]
    fn test_snapshot_json_uses_attribute_names() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &test_issue().snapshot()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(value["id"], "proj-a");
        assert_eq!(value["blockedBy"], serde_json::json!(["proj-b"]));
        assert_eq!(value["parentIssue"], "proj-p");
        assert_eq!(value["childrenIssues"], serde_json::json!([]));
    }

    #[test]
    fn test_audit_text() {
        plain();
        let report = AuditReport {
            issues_scanned: 2,
            edges_checked: 1,
            findings: vec![Finding::Dangling {
                issue: IssueId::new("proj-a"),
                kind: RelationKind::RelatedTo,
                target: IssueId::new("proj-x"),
            }],
        };
        let mut buffer = Vec::new();
        write_audit(&mut buffer, &report).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.contains("1 problem(s) found"));
        assert!(output.contains("proj-x does not exist"));
    }
}
