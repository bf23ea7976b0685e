//! The resolved session state and its read-only projection.

use crate::{AuthenticatedIdentity, Role};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// What the application knows about the current visitor.
///
/// Identity and role travel together in one variant, so a reader can never
/// observe one identity paired with another identity's role.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedSessionState {
    /// Bootstrap has not finished. Consumers must not render role-gated content.
    #[default]
    Unresolved,
    /// No valid session.
    Unauthenticated,
    /// A confirmed session whose role has been looked up.
    Authenticated {
        identity: AuthenticatedIdentity,
        role: Role,
    },
}

impl ResolvedSessionState {
    pub fn authenticated(identity: AuthenticatedIdentity, role: Role) -> Self {
        ResolvedSessionState::Authenticated { identity, role }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ResolvedSessionState::Unresolved)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, ResolvedSessionState::Authenticated { .. })
    }

    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        match self {
            ResolvedSessionState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            ResolvedSessionState::Authenticated { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// Flat view of a [`ResolvedSessionState`] for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub resolved: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl From<&ResolvedSessionState> for SessionSummary {
    fn from(state: &ResolvedSessionState) -> Self {
        let identity = state.identity();
        Self {
            resolved: state.is_resolved(),
            authenticated: state.is_authenticated(),
            user_id: identity.map(|i| i.id.clone()),
            email: identity.and_then(|i| i.email.clone()),
            role: state.role(),
        }
    }
}

/// Read-only handle on the resolver's state.
///
/// Cloning is cheap; every clone tracks "seen" changes independently.
#[derive(Debug, Clone)]
pub struct SessionStateReader {
    rx: watch::Receiver<ResolvedSessionState>,
}

impl SessionStateReader {
    pub(crate) fn new(rx: watch::Receiver<ResolvedSessionState>) -> Self {
        Self { rx }
    }

    /// The latest state.
    pub fn current(&self) -> ResolvedSessionState {
        self.rx.borrow().clone()
    }

    /// Whether the state changed since this reader last looked.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Mark the current state as seen and return it.
    pub fn mark_seen(&mut self) -> ResolvedSessionState {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next change. `None` once the resolver is gone.
    pub async fn changed(&mut self) -> Option<ResolvedSessionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until `predicate` holds. `None` once the resolver is gone.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&ResolvedSessionState) -> bool,
    ) -> Option<ResolvedSessionState> {
        self.rx
            .wait_for(|state| predicate(state))
            .await
            .ok()
            .map(|state| state.clone())
    }

    /// Wait until bootstrap has produced a state.
    pub async fn resolved(&mut self) -> Option<ResolvedSessionState> {
        self.wait_for(ResolvedSessionState::is_resolved).await
    }
}
