//! Common fixtures shared across integration tests.

#![allow(dead_code)]

use chrono::Utc;
use lattice::access::{AllowAll, MembershipGuard, Memberships, Role};
use lattice::domain::{Actor, Issue, IssueId, IssueStatus, IssueType, ProjectId, Relations};
use lattice::graph::RelationGraph;
use lattice::storage::IssueStore;
use lattice::storage::in_memory::InMemoryStore;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

/// Shorthand for an issue id.
pub fn id(s: &str) -> IssueId {
    IssueId::new(s)
}

/// A row with no relations; the project is taken from the id prefix.
pub fn issue(raw: &str) -> Issue {
    let now = Utc::now();
    let id = id(raw);
    let project = id.project().expect("fixture ids carry a project prefix");
    Issue {
        id,
        project_id: project,
        title: format!("Issue {raw}"),
        description: String::new(),
        status: IssueStatus::Open,
        issue_type: IssueType::Task,
        relations: Relations::default(),
        created_at: now,
        updated_at: now,
    }
}

/// An in-memory store holding one empty row per id.
pub fn seeded(ids: &[&str]) -> InMemoryStore {
    InMemoryStore::with_issues(ids.iter().map(|raw| issue(raw)))
}

/// A graph service that authorizes everyone.
pub fn open_graph(store: impl IssueStore + 'static) -> RelationGraph {
    RelationGraph::new(Arc::new(store), Arc::new(AllowAll::new()))
}

/// A graph service where `alice` owns `p1`, `carol` contributes to `p1`,
/// `vic` views `p1`, and `bob` owns `p2`.
pub fn guarded_graph(store: impl IssueStore + 'static) -> RelationGraph {
    let mut memberships = Memberships::new();
    memberships.entry("p1".to_string()).or_default().extend([
        ("alice".to_string(), Role::Owner),
        ("carol".to_string(), Role::Contributor),
        ("vic".to_string(), Role::Viewer),
    ]);
    memberships
        .entry("p2".to_string())
        .or_default()
        .insert("bob".to_string(), Role::Owner);
    RelationGraph::new(Arc::new(store), Arc::new(MembershipGuard::new(memberships)))
}

/// The default actor used by tests that don't exercise authorization.
pub fn alice() -> Actor {
    Actor::new("alice")
}

/// Read a row that must exist.
pub async fn row(store: &InMemoryStore, raw: &str) -> Issue {
    store
        .get(&id(raw))
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("row {raw} should exist"))
}

/// Snapshot every row, for "nothing changed" assertions.
pub async fn all_rows(store: &InMemoryStore) -> Vec<Issue> {
    store.scan().await.unwrap()
}

/// Run the `lattice` binary in `dir` as `actor`.
pub fn run_lattice_as(dir: &Path, actor: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lattice"))
        .args(args)
        .current_dir(dir)
        .env("LATTICE_ACTOR", actor)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute lattice binary")
}

/// Run the `lattice` binary in `dir` as `alice`.
pub fn run_lattice_in_dir(dir: &Path, args: &[&str]) -> Output {
    run_lattice_as(dir, "alice", args)
}
