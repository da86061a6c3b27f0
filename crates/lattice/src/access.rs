//! Access guard for mutating operations.
//!
//! The graph service asks the guard once per mutation, before it reads any
//! row, whether an actor may perform a capability in the project that owns
//! the affected issue. Membership data comes from outside the graph; the
//! default implementation reads it from the `memberships` section of the
//! workspace configuration.

use crate::domain::{Actor, ProjectId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Something an actor may be allowed to do in a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create issues and add or remove relations
    EditIssues,
    /// Delete issues (cascading their relations)
    DeleteIssues,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::EditIssues => write!(f, "edit issues"),
            Capability::DeleteIssues => write!(f, "delete issues"),
        }
    }
}

/// Role of an actor within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full control
    Owner,
    /// Manages issues
    Maintainer,
    /// Works on issues
    Contributor,
    /// Read-only
    Viewer,
}

impl Role {
    /// Whether this role grants `capability`.
    pub fn grants(self, capability: Capability) -> bool {
        match capability {
            Capability::EditIssues => {
                matches!(self, Role::Owner | Role::Maintainer | Role::Contributor)
            }
            Capability::DeleteIssues => matches!(self, Role::Owner | Role::Maintainer),
        }
    }
}

/// Authorization predicate consumed by the graph service.
#[async_trait]
pub trait AccessGuard: Send + Sync {
    /// Whether `actor` may perform `capability` in `project`.
    async fn is_authorized(
        &self,
        actor: &Actor,
        project: &ProjectId,
        capability: Capability,
    ) -> bool;
}

/// Project membership table: project -> actor name -> role.
pub type Memberships = BTreeMap<String, BTreeMap<String, Role>>;

/// Access guard backed by a static membership table.
#[derive(Debug, Clone, Default)]
pub struct MembershipGuard {
    memberships: Memberships,
}

impl MembershipGuard {
    /// Create a guard from a membership table.
    pub fn new(memberships: Memberships) -> Self {
        Self { memberships }
    }

    /// Role of `actor` in `project`, if any.
    pub fn role(&self, actor: &Actor, project: &ProjectId) -> Option<Role> {
        self.memberships
            .get(project.as_str())
            .and_then(|members| members.get(actor.as_str()))
            .copied()
    }
}

#[async_trait]
impl AccessGuard for MembershipGuard {
    async fn is_authorized(
        &self,
        actor: &Actor,
        project: &ProjectId,
        capability: Capability,
    ) -> bool {
        let allowed = self
            .role(actor, project)
            .is_some_and(|role| role.grants(capability));
        tracing::debug!(%actor, %project, %capability, allowed, "Access check");
        allowed
    }
}

/// Guard that authorizes everyone. For tests only.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct AllowAll;

#[cfg(any(test, feature = "test-util"))]
impl AllowAll {
    /// Create a new AllowAll guard.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl AccessGuard for AllowAll {
    async fn is_authorized(&self, _: &Actor, _: &ProjectId, _: Capability) -> bool {
        true
    }
}
