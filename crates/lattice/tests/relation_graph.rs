//! Integration tests for the relation graph service.
//!
//! Covers the mirror invariant for every relation kind, idempotence, removal,
//! cascading delete, and the checks that must reject a call before any row
//! is written.

mod common;

use common::{alice, all_rows, guarded_graph, id, open_graph, row, seeded};
use lattice::domain::{Actor, IssueType, NewIssue, ProjectId};
use lattice::error::Error;
use lattice::graph::DeleteReport;
use lattice::relation::RelationKind;
use lattice::storage::IssueStore;
use rstest::rstest;

// ========== Self-relation ==========

#[rstest]
#[case::blocks(RelationKind::Blocks)]
#[case::blocked_by(RelationKind::BlockedBy)]
#[case::related_to(RelationKind::RelatedTo)]
#[case::duplicate_of(RelationKind::DuplicateOf)]
#[case::parent(RelationKind::Parent)]
#[case::children(RelationKind::Children)]
#[tokio::test]
async fn test_self_relation_rejected(#[case] kind: RelationKind) {
    let store = seeded(&["p1-a"]);
    let graph = open_graph(store.clone());
    let before = row(&store, "p1-a").await;

    let result = graph.add_relation(&id("p1-a"), kind, &id("p1-a"), &alice()).await;

    assert!(matches!(result, Err(Error::SelfRelation { .. })));
    assert_eq!(row(&store, "p1-a").await, before);
}

#[tokio::test]
async fn test_self_relation_checked_before_existence_and_access() {
    // Neither the row nor a role is needed to get the self-relation error
    let store = seeded(&[]);
    let graph = guarded_graph(store);

    let result = graph
        .add_relation(
            &id("p1-ghost"),
            RelationKind::Blocks,
            &id("p1-ghost"),
            &Actor::anonymous(),
        )
        .await;
    assert!(matches!(result, Err(Error::SelfRelation { .. })));
}

// ========== Mirror invariant ==========

#[rstest]
#[case::blocks(RelationKind::Blocks)]
#[case::blocked_by(RelationKind::BlockedBy)]
#[case::related_to(RelationKind::RelatedTo)]
#[case::duplicate_of(RelationKind::DuplicateOf)]
#[case::parent(RelationKind::Parent)]
#[case::children(RelationKind::Children)]
#[tokio::test]
async fn test_add_writes_both_endpoints(#[case] kind: RelationKind) {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());

    let snapshot = graph
        .add_relation(&id("p1-a"), kind, &id("p1-b"), &alice())
        .await
        .unwrap();

    assert!(snapshot.relations.contains(kind, &id("p1-b")));
    let source = row(&store, "p1-a").await;
    let target = row(&store, "p1-b").await;
    assert!(source.relations.contains(kind, &id("p1-b")));
    assert!(target.relations.contains(kind.mirror(), &id("p1-a")));
    assert_eq!(source.relations.degree(), 1);
    assert_eq!(target.relations.degree(), 1);
}

#[tokio::test]
async fn test_blocks_mirrors_as_blocked_by() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await
        .unwrap();

    assert!(row(&store, "p1-b").await.relations.blocked_by.contains(&id("p1-a")));
}

#[rstest]
#[case::related_to(RelationKind::RelatedTo)]
#[case::duplicate_of(RelationKind::DuplicateOf)]
#[tokio::test]
async fn test_symmetric_kinds_use_same_attribute(#[case] kind: RelationKind) {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-a"), kind, &id("p1-b"), &alice())
        .await
        .unwrap();

    assert!(row(&store, "p1-a").await.relations.contains(kind, &id("p1-b")));
    assert!(row(&store, "p1-b").await.relations.contains(kind, &id("p1-a")));
}

#[tokio::test]
async fn test_relations_cross_projects() {
    let store = seeded(&["p1-a", "p2-b"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-a"), RelationKind::RelatedTo, &id("p2-b"), &alice())
        .await
        .unwrap();

    assert!(row(&store, "p2-b").await.relations.related_to.contains(&id("p1-a")));
}

// ========== Idempotence ==========

#[rstest]
#[case::blocks(RelationKind::Blocks)]
#[case::related_to(RelationKind::RelatedTo)]
#[case::parent(RelationKind::Parent)]
#[case::children(RelationKind::Children)]
#[tokio::test]
async fn test_add_is_idempotent(#[case] kind: RelationKind) {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-a"), kind, &id("p1-b"), &alice())
        .await
        .unwrap();
    let after_first = all_rows(&store).await;
    graph
        .add_relation(&id("p1-a"), kind, &id("p1-b"), &alice())
        .await
        .unwrap();

    assert_eq!(row(&store, "p1-a").await.relations.neighbors(kind).len(), 1);
    assert_eq!(row(&store, "p1-b").await.relations.neighbors(kind.mirror()).len(), 1);
    // A no-op repeat doesn't even touch updated_at
    assert_eq!(all_rows(&store).await, after_first);
}

#[tokio::test]
async fn test_add_from_either_side_is_the_same_edge() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await
        .unwrap();
    let before = all_rows(&store).await;
    graph
        .add_relation(&id("p1-b"), RelationKind::BlockedBy, &id("p1-a"), &alice())
        .await
        .unwrap();

    assert_eq!(all_rows(&store).await, before);
}

// ========== Parent replacement ==========

#[tokio::test]
async fn test_set_parent_replaces_previous_parent() {
    let store = seeded(&["p1-child", "p1-old", "p1-new"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-child"), RelationKind::Parent, &id("p1-old"), &alice())
        .await
        .unwrap();
    graph
        .add_relation(&id("p1-child"), RelationKind::Parent, &id("p1-new"), &alice())
        .await
        .unwrap();

    let child = row(&store, "p1-child").await;
    assert_eq!(child.relations.parent_issue, Some(id("p1-new")));
    assert!(row(&store, "p1-new").await.relations.children_issues.contains(&id("p1-child")));
    assert!(row(&store, "p1-old").await.relations.children_issues.is_empty());
    assert!(graph.audit().await.unwrap().is_clean());
}

#[tokio::test]
async fn test_adopting_a_child_detaches_it_from_previous_parent() {
    let store = seeded(&["p1-child", "p1-old", "p1-new"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-old"), RelationKind::Children, &id("p1-child"), &alice())
        .await
        .unwrap();
    graph
        .add_relation(&id("p1-new"), RelationKind::Children, &id("p1-child"), &alice())
        .await
        .unwrap();

    assert_eq!(row(&store, "p1-child").await.relations.parent_issue, Some(id("p1-new")));
    assert!(row(&store, "p1-old").await.relations.children_issues.is_empty());
    assert!(graph.audit().await.unwrap().is_clean());
}

// ========== Removal ==========

#[tokio::test]
async fn test_remove_clears_both_endpoints() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await
        .unwrap();
    graph
        .remove_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await
        .unwrap();

    assert!(!row(&store, "p1-a").await.relations.blocks.contains(&id("p1-b")));
    assert!(!row(&store, "p1-b").await.relations.blocked_by.contains(&id("p1-a")));
}

#[tokio::test]
async fn test_remove_parent_clears_child_list() {
    let store = seeded(&["p1-child", "p1-parent"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-child"), RelationKind::Parent, &id("p1-parent"), &alice())
        .await
        .unwrap();
    graph
        .remove_relation(&id("p1-child"), RelationKind::Parent, &id("p1-parent"), &alice())
        .await
        .unwrap();

    assert!(row(&store, "p1-child").await.relations.parent_issue.is_none());
    assert!(row(&store, "p1-parent").await.relations.children_issues.is_empty());
}

#[tokio::test]
async fn test_remove_before_add_is_rejected() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());
    let before = all_rows(&store).await;

    let result = graph
        .remove_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await;

    assert!(matches!(result, Err(Error::RelationNotFound { .. })));
    assert_eq!(all_rows(&store).await, before);
}

#[tokio::test]
async fn test_repeated_remove_reports_relation_not_found() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());

    graph
        .add_relation(&id("p1-a"), RelationKind::RelatedTo, &id("p1-b"), &alice())
        .await
        .unwrap();
    graph
        .remove_relation(&id("p1-a"), RelationKind::RelatedTo, &id("p1-b"), &alice())
        .await
        .unwrap();
    let again = graph
        .remove_relation(&id("p1-a"), RelationKind::RelatedTo, &id("p1-b"), &alice())
        .await;

    assert!(matches!(again, Err(Error::RelationNotFound { .. })));
}

#[tokio::test]
async fn test_remove_with_missing_target_clears_dangling_reference() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());
    graph
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await
        .unwrap();
    // Drop the target behind the service's back
    store.delete(&id("p1-b")).await.unwrap();

    graph
        .remove_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await
        .unwrap();

    assert!(row(&store, "p1-a").await.relations.is_empty());
}

#[tokio::test]
async fn test_remove_self_relation_rejected() {
    let store = seeded(&["p1-a"]);
    let graph = open_graph(store);

    let result = graph
        .remove_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-a"), &alice())
        .await;
    assert!(matches!(result, Err(Error::SelfRelation { .. })));
}

// ========== Missing issues ==========

#[tokio::test]
async fn test_missing_target_rejected_before_mutation() {
    let store = seeded(&["p1-a"]);
    let graph = open_graph(store.clone());
    let before = row(&store, "p1-a").await;

    let result = graph
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-nope"), &alice())
        .await;

    assert!(matches!(result, Err(Error::IssueNotFound(ref missing)) if *missing == id("p1-nope")));
    assert_eq!(row(&store, "p1-a").await, before);
}

#[tokio::test]
async fn test_missing_source_rejected_before_mutation() {
    let store = seeded(&["p1-b"]);
    let graph = open_graph(store.clone());
    let before = all_rows(&store).await;

    let result = graph
        .add_relation(&id("p1-nope"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await;

    assert!(matches!(result, Err(Error::IssueNotFound(_))));
    assert_eq!(all_rows(&store).await, before);
}

#[tokio::test]
async fn test_malformed_id_is_not_found() {
    let store = seeded(&["p1-a"]);
    let graph = guarded_graph(store);

    let result = graph
        .add_relation(&id("garbage"), RelationKind::Blocks, &id("p1-a"), &alice())
        .await;
    assert!(matches!(result, Err(Error::IssueNotFound(_))));
}

// ========== Cascade on delete ==========

#[tokio::test]
async fn test_delete_cascades_to_every_neighbour() {
    let store = seeded(&["p1-a", "p1-b", "p1-c", "p1-d", "p1-e", "p1-f", "p1-g", "p1-h"]);
    let graph = open_graph(store.clone());
    let edges = [
        (RelationKind::Blocks, "p1-b"),
        (RelationKind::BlockedBy, "p1-c"),
        (RelationKind::RelatedTo, "p1-d"),
        (RelationKind::DuplicateOf, "p1-e"),
        (RelationKind::Parent, "p1-f"),
        (RelationKind::Children, "p1-g"),
    ];
    for (kind, target) in edges {
        graph
            .add_relation(&id("p1-a"), kind, &id(target), &alice())
            .await
            .unwrap();
    }
    // An unrelated edge between neighbours must survive
    graph
        .add_relation(&id("p1-b"), RelationKind::RelatedTo, &id("p1-h"), &alice())
        .await
        .unwrap();

    let report = graph.delete_issue(&id("p1-a"), &alice()).await.unwrap();

    assert_eq!(report.edges, 6);
    assert_eq!(report.references_removed, 6);
    assert!(store.get(&id("p1-a")).await.unwrap().is_none());
    assert!(!row(&store, "p1-b").await.relations.blocked_by.contains(&id("p1-a")));
    assert!(!row(&store, "p1-c").await.relations.blocks.contains(&id("p1-a")));
    assert!(!row(&store, "p1-d").await.relations.related_to.contains(&id("p1-a")));
    assert!(!row(&store, "p1-e").await.relations.duplicate_of.contains(&id("p1-a")));
    assert!(!row(&store, "p1-f").await.relations.children_issues.contains(&id("p1-a")));
    assert_ne!(row(&store, "p1-g").await.relations.parent_issue, Some(id("p1-a")));
    assert!(row(&store, "p1-b").await.relations.related_to.contains(&id("p1-h")));
    assert!(graph.audit().await.unwrap().is_clean());
}

#[tokio::test]
async fn test_repeated_delete_succeeds() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());
    graph
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await
        .unwrap();
    graph.delete_issue(&id("p1-a"), &alice()).await.unwrap();

    let report = graph.delete_issue(&id("p1-a"), &alice()).await.unwrap();

    assert_eq!(report, DeleteReport::default());
    assert!(row(&store, "p1-b").await.relations.is_empty());
}

#[tokio::test]
async fn test_delete_never_created_issue_succeeds() {
    let graph = open_graph(seeded(&[]));

    let report = graph.delete_issue(&id("p1-a"), &alice()).await.unwrap();
    assert_eq!(report.edges, 0);
}

#[tokio::test]
async fn test_delete_tolerates_missing_neighbour() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = open_graph(store.clone());
    graph
        .add_relation(&id("p1-a"), RelationKind::RelatedTo, &id("p1-b"), &alice())
        .await
        .unwrap();
    store.delete(&id("p1-b")).await.unwrap();

    let report = graph.delete_issue(&id("p1-a"), &alice()).await.unwrap();

    assert_eq!(report.edges, 1);
    assert_eq!(report.references_removed, 0);
    assert!(store.is_empty().await);
}

// ========== Authorization ==========

#[rstest]
#[case::anonymous("")]
#[case::stranger("mallory")]
#[case::other_project_owner("bob")]
#[tokio::test]
async fn test_unauthorized_actor_changes_nothing(#[case] name: &str) {
    let store = seeded(&["p1-a", "p1-b", "p1-c"]);
    open_graph(store.clone())
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &alice())
        .await
        .unwrap();
    let graph = guarded_graph(store.clone());
    let actor = Actor::new(name);
    let before = all_rows(&store).await;

    let add = graph
        .add_relation(&id("p1-a"), RelationKind::RelatedTo, &id("p1-c"), &actor)
        .await;
    let remove = graph
        .remove_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &actor)
        .await;
    let delete = graph.delete_issue(&id("p1-a"), &actor).await;
    let create = graph
        .create_issue(
            NewIssue {
                project_id: ProjectId::from("p1"),
                title: "Sneaky".to_string(),
                description: String::new(),
                issue_type: IssueType::Task,
            },
            &actor,
        )
        .await;

    assert!(matches!(add, Err(Error::PermissionDenied { .. })));
    assert!(matches!(remove, Err(Error::PermissionDenied { .. })));
    assert!(matches!(delete, Err(Error::PermissionDenied { .. })));
    assert!(matches!(create, Err(Error::PermissionDenied { .. })));
    assert_eq!(all_rows(&store).await, before);
}

#[tokio::test]
async fn test_permission_checked_before_existence() {
    // A stranger learns nothing about which ids exist
    let store = seeded(&[]);
    let graph = guarded_graph(store);

    let result = graph
        .add_relation(&id("p1-x"), RelationKind::Blocks, &id("p1-y"), &Actor::new("mallory"))
        .await;
    assert!(matches!(result, Err(Error::PermissionDenied { .. })));
}

#[tokio::test]
async fn test_contributor_can_link_but_not_delete() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = guarded_graph(store.clone());
    let carol = Actor::new("carol");

    graph
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &carol)
        .await
        .unwrap();
    let delete = graph.delete_issue(&id("p1-a"), &carol).await;

    assert!(matches!(
        delete,
        Err(Error::PermissionDenied { ref capability, .. })
            if capability.to_string() == "delete issues"
    ));
    assert!(store.get(&id("p1-a")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_viewer_cannot_link() {
    let store = seeded(&["p1-a", "p1-b"]);
    let graph = guarded_graph(store);

    let result = graph
        .add_relation(&id("p1-a"), RelationKind::Blocks, &id("p1-b"), &Actor::new("vic"))
        .await;
    assert!(matches!(result, Err(Error::PermissionDenied { .. })));
}

#[tokio::test]
async fn test_reads_are_not_gated() {
    let store = seeded(&["p1-a"]);
    let graph = guarded_graph(store);

    let snapshot = graph.relations(&id("p1-a")).await.unwrap();
    assert_eq!(snapshot.id, id("p1-a"));
    assert!(snapshot.relations.is_empty());
    assert!(graph.get_issue(&id("p1-a")).await.unwrap().is_some());
    assert!(matches!(
        graph.relations(&id("p1-zz")).await,
        Err(Error::IssueNotFound(_))
    ));
}

// ========== Creation ==========

#[tokio::test]
async fn test_create_issue_in_project() {
    let store = seeded(&[]);
    let graph = guarded_graph(store.clone());

    let issue = graph
        .create_issue(
            NewIssue {
                project_id: ProjectId::from("p1"),
                title: "  Write docs  ".to_string(),
                description: "All of them".to_string(),
                issue_type: IssueType::Ticket,
            },
            &alice(),
        )
        .await
        .unwrap();

    assert!(issue.id.as_str().starts_with("p1-"));
    assert_eq!(issue.id.project(), Some(ProjectId::from("p1")));
    assert_eq!(issue.title, "Write docs");
    assert!(issue.relations.is_empty());
    let stored = store.get(&issue.id).await.unwrap();
    assert_eq!(stored, Some(issue));
}

#[rstest]
#[case::empty_title("p1", "   ".to_string())]
#[case::long_title("p1", "x".repeat(201))]
#[case::bad_project("p-1", "Title".to_string())]
#[tokio::test]
async fn test_create_issue_validation(#[case] project: &str, #[case] title: String) {
    let store = seeded(&[]);
    let graph = open_graph(store.clone());

    let result = graph
        .create_issue(
            NewIssue {
                project_id: ProjectId::from(project),
                title,
                description: String::new(),
                issue_type: IssueType::Task,
            },
            &alice(),
        )
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_created_issues_get_distinct_ids() {
    let store = seeded(&[]);
    let graph = open_graph(store.clone());

    for _ in 0..20 {
        graph
            .create_issue(
                NewIssue {
                    project_id: ProjectId::from("p1"),
                    title: "Same title".to_string(),
                    description: String::new(),
                    issue_type: IssueType::Task,
                },
                &alice(),
            )
            .await
            .unwrap();
    }
    assert_eq!(store.len().await, 20);
}
