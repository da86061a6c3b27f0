//! Router and handlers.
//!
//! | Method | Path | Graph call |
//! |---|---|---|
//! | `POST` | `/issues/{issue}/{kind}/{target}` | `add_relation` (any kind but `parent`) |
//! | `PUT` | `/issues/{issue}/parent/{target}` | `add_relation` with `parent` |
//! | `DELETE` | `/issues/{issue}/{kind}/{target}` | `remove_relation` |
//! | `DELETE` | `/issues/{issue}` | `delete_issue` |
//! | `GET` | `/issues/{issue}/relations` | `relations` |

use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use lattice::domain::{Actor, IssueId, RelationSnapshot};
use lattice::error::Error;
use lattice::graph::RelationGraph;
use lattice::relation::RelationKind;
use std::convert::Infallible;
use std::sync::Arc;

use crate::error::ApiError;

/// Header naming the acting user.
pub const ACTOR_HEADER: &str = "x-actor";

/// Shared handler state.
pub type SharedGraph = Arc<RelationGraph>;

/// The actor taken from the [`ACTOR_HEADER`] header.
///
/// A missing, empty or non-UTF-8 header yields the anonymous actor, which
/// holds no role anywhere.
#[derive(Debug, Clone)]
pub struct ActingUser(pub Actor);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(Actor::anonymous, Actor::new);
        Ok(ActingUser(actor))
    }
}

/// Build the router over a shared graph service.
pub fn router(graph: SharedGraph) -> Router {
    Router::new()
        .route("/issues/{issue}", delete(delete_issue))
        .route("/issues/{issue}/relations", get(relations))
        .route(
            "/issues/{issue}/{kind}/{target}",
            post(add_relation).put(set_parent).delete(remove_relation),
        )
        .with_state(graph)
}

fn parse_kind(segment: &str) -> Result<RelationKind, Error> {
    RelationKind::from_segment(segment)
        .ok_or_else(|| Error::UnknownRelationKind(segment.to_string()))
}

async fn add_relation(
    State(graph): State<SharedGraph>,
    ActingUser(actor): ActingUser,
    Path((issue, kind, target)): Path<(String, String, String)>,
) -> Result<Json<RelationSnapshot>, ApiError> {
    let kind = parse_kind(&kind)?;
    // Parents are set with PUT: an issue has at most one
    if kind == RelationKind::Parent {
        return Err(ApiError::KindNotRoutable(kind.to_string()));
    }
    let snapshot = graph
        .add_relation(&IssueId::new(issue), kind, &IssueId::new(target), &actor)
        .await?;
    Ok(Json(snapshot))
}

async fn set_parent(
    State(graph): State<SharedGraph>,
    ActingUser(actor): ActingUser,
    Path((child, kind, parent)): Path<(String, String, String)>,
) -> Result<Json<RelationSnapshot>, ApiError> {
    let kind = parse_kind(&kind)?;
    if kind != RelationKind::Parent {
        return Err(ApiError::KindNotRoutable(kind.to_string()));
    }
    let snapshot = graph
        .add_relation(&IssueId::new(child), kind, &IssueId::new(parent), &actor)
        .await?;
    Ok(Json(snapshot))
}

async fn remove_relation(
    State(graph): State<SharedGraph>,
    ActingUser(actor): ActingUser,
    Path((issue, kind, target)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    graph
        .remove_relation(&IssueId::new(issue), kind, &IssueId::new(target), &actor)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_issue(
    State(graph): State<SharedGraph>,
    ActingUser(actor): ActingUser,
    Path(issue): Path<String>,
) -> Result<StatusCode, ApiError> {
    let report = graph.delete_issue(&IssueId::new(issue), &actor).await?;
    tracing::debug!(edges = report.edges, "Delete request served");
    Ok(StatusCode::NO_CONTENT)
}

async fn relations(
    State(graph): State<SharedGraph>,
    Path(issue): Path<String>,
) -> Result<Json<RelationSnapshot>, ApiError> {
    Ok(Json(graph.relations(&IssueId::new(issue)).await?))
}
