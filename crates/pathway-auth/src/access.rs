//! Role-based access policy and dashboard routing.
//!
//! Pure functions over a [`ResolvedSessionState`]: no IO, no panics.

use crate::{ResolvedSessionState, Role};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Something a visitor may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    RegisterPilgrim,
    UploadPayment,
    ViewOwnPayments,
    UploadDocuments,
    OpenSupportTicket,
    ViewAgentDashboard,
    ManagePilgrims,
    VerifyPayments,
    ManageSupportTickets,
    ViewAdminDashboard,
}

const PILGRIM_CAPABILITIES: &[Capability] = &[
    Capability::RegisterPilgrim,
    Capability::UploadPayment,
    Capability::ViewOwnPayments,
    Capability::UploadDocuments,
    Capability::OpenSupportTicket,
];

const AGENT_CAPABILITIES: &[Capability] = &[
    Capability::RegisterPilgrim,
    Capability::UploadPayment,
    Capability::ViewOwnPayments,
    Capability::UploadDocuments,
    Capability::OpenSupportTicket,
    Capability::ViewAgentDashboard,
    Capability::ManagePilgrims,
];

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::RegisterPilgrim,
    Capability::UploadPayment,
    Capability::ViewOwnPayments,
    Capability::UploadDocuments,
    Capability::OpenSupportTicket,
    Capability::ViewAgentDashboard,
    Capability::ManagePilgrims,
    Capability::VerifyPayments,
    Capability::ManageSupportTickets,
    Capability::ViewAdminDashboard,
];

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::RegisterPilgrim => "register_pilgrim",
            Capability::UploadPayment => "upload_payment",
            Capability::ViewOwnPayments => "view_own_payments",
            Capability::UploadDocuments => "upload_documents",
            Capability::OpenSupportTicket => "open_support_ticket",
            Capability::ViewAgentDashboard => "view_agent_dashboard",
            Capability::ManagePilgrims => "manage_pilgrims",
            Capability::VerifyPayments => "verify_payments",
            Capability::ManageSupportTickets => "manage_support_tickets",
            Capability::ViewAdminDashboard => "view_admin_dashboard",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities granted to `role`.
pub fn capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Pilgrim => PILGRIM_CAPABILITIES,
        Role::Agent => AGENT_CAPABILITIES,
        Role::Admin => ADMIN_CAPABILITIES,
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The session has not been resolved yet; nothing role-gated may render.
    #[error("session not resolved yet")]
    Unresolved,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("forbidden: role '{role}' lacks '{capability}'")]
    Forbidden { role: Role, capability: Capability },
}

/// Check `capability` against the resolved state.
pub fn authorize(state: &ResolvedSessionState, capability: Capability) -> Result<(), AccessError> {
    match state {
        ResolvedSessionState::Unresolved => Err(AccessError::Unresolved),
        ResolvedSessionState::Unauthenticated => Err(AccessError::NotAuthenticated),
        ResolvedSessionState::Authenticated { role, .. } => {
            if capabilities(*role).contains(&capability) {
                Ok(())
            } else {
                Err(AccessError::Forbidden {
                    role: *role,
                    capability,
                })
            }
        }
    }
}

/// Which dashboard an authenticated visitor lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardView {
    Admin,
    Agent,
    Payments,
}

impl DashboardView {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => DashboardView::Admin,
            Role::Agent => DashboardView::Agent,
            Role::Pilgrim => DashboardView::Payments,
        }
    }

    /// `None` unless the state is authenticated.
    pub fn for_state(state: &ResolvedSessionState) -> Option<Self> {
        state.role().map(Self::for_role)
    }
}

/// Top-level navigation tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavTab {
    Home,
    Register,
    Payments,
    Documents,
    Dashboard,
    Notifications,
    Support,
    Resources,
}

impl NavTab {
    pub const ALL: [NavTab; 8] = [
        NavTab::Home,
        NavTab::Register,
        NavTab::Payments,
        NavTab::Documents,
        NavTab::Dashboard,
        NavTab::Notifications,
        NavTab::Support,
        NavTab::Resources,
    ];

    /// Visible without signing in.
    pub fn is_public(&self) -> bool {
        matches!(self, NavTab::Home | NavTab::Resources)
    }
}

/// Tabs to show for `state`. Unresolved visitors see only public tabs.
pub fn visible_tabs(state: &ResolvedSessionState) -> Vec<NavTab> {
    NavTab::ALL
        .into_iter()
        .filter(|tab| state.is_authenticated() || tab.is_public())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthenticatedIdentity;

    fn signed_in(role: Role) -> ResolvedSessionState {
        ResolvedSessionState::authenticated(AuthenticatedIdentity::new("user-1", None), role)
    }

    #[test]
    fn test_unresolved_and_unauthenticated_are_denied() {
        assert_eq!(
            authorize(&ResolvedSessionState::Unresolved, Capability::UploadPayment),
            Err(AccessError::Unresolved)
        );
        assert_eq!(
            authorize(&ResolvedSessionState::Unauthenticated, Capability::UploadPayment),
            Err(AccessError::NotAuthenticated)
        );
    }

    #[test]
    fn test_pilgrim_cannot_verify_payments() {
        assert_eq!(authorize(&signed_in(Role::Pilgrim), Capability::UploadPayment), Ok(()));
        assert_eq!(
            authorize(&signed_in(Role::Pilgrim), Capability::VerifyPayments),
            Err(AccessError::Forbidden {
                role: Role::Pilgrim,
                capability: Capability::VerifyPayments
            })
        );
    }

    #[test]
    fn test_agent_manages_pilgrims_but_not_tickets() {
        let agent = signed_in(Role::Agent);
        assert_eq!(authorize(&agent, Capability::ManagePilgrims), Ok(()));
        assert_eq!(authorize(&agent, Capability::ViewAgentDashboard), Ok(()));
        assert!(authorize(&agent, Capability::ManageSupportTickets).is_err());
        assert!(authorize(&agent, Capability::ViewAdminDashboard).is_err());
    }

    #[test]
    fn test_roles_are_nested() {
        for cap in capabilities(Role::Pilgrim) {
            assert!(capabilities(Role::Agent).contains(cap));
        }
        for cap in capabilities(Role::Agent) {
            assert!(capabilities(Role::Admin).contains(cap));
        }
        assert_eq!(capabilities(Role::Admin).len(), 10);
    }

    #[test]
    fn test_dashboard_routing() {
        assert_eq!(DashboardView::for_role(Role::Admin), DashboardView::Admin);
        assert_eq!(DashboardView::for_role(Role::Agent), DashboardView::Agent);
        assert_eq!(DashboardView::for_role(Role::Pilgrim), DashboardView::Payments);
        assert_eq!(DashboardView::for_state(&ResolvedSessionState::Unauthenticated), None);
    }

    #[test]
    fn test_visible_tabs() {
        let public = visible_tabs(&ResolvedSessionState::Unresolved);
        assert_eq!(public, vec![NavTab::Home, NavTab::Resources]);
        assert_eq!(visible_tabs(&ResolvedSessionState::Unauthenticated), public);
        assert_eq!(visible_tabs(&signed_in(Role::Pilgrim)).len(), NavTab::ALL.len());
    }

    #[test]
    fn test_forbidden_message_names_role_and_capability() {
        let err = authorize(&signed_in(Role::Pilgrim), Capability::ViewAdminDashboard).unwrap_err();
        assert_eq!(
            err.to_string(),
            "forbidden: role 'pilgrim' lacks 'view_admin_dashboard'"
        );
    }
}
