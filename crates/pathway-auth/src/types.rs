//! Identity, session, and profile types exchanged with the auth collaborators.

use crate::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who the backend says the visitor is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    /// Stable identifier (Supabase `auth.users.id`).
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthenticatedIdentity {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }
}

/// A live backend session. Tokens are never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthenticatedIdentity,
}

impl Session {
    pub fn identity(&self) -> &AuthenticatedIdentity {
        &self.user
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Application profile row keyed by identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub identity_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Session change notifications delivered by an auth provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    /// Emitted once when a listener first learns of an existing session.
    InitialSession,
    SignedIn,
    TokenRefreshed,
    UserUpdated,
    SignedOut,
}

impl SessionEvent {
    /// Every event except `SignedOut` confirms (or re-confirms) a session.
    pub fn is_sign_in(&self) -> bool {
        !matches!(self, SessionEvent::SignedOut)
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionEvent::InitialSession => "initial_session",
            SessionEvent::SignedIn => "signed_in",
            SessionEvent::TokenRefreshed => "token_refreshed",
            SessionEvent::UserUpdated => "user_updated",
            SessionEvent::SignedOut => "signed_out",
        };
        f.write_str(name)
    }
}

/// Profile data submitted with a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpProfile {
    pub username: String,
    pub role: Role,
}

impl SignUpProfile {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Result of a successful sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account was confirmed immediately and a session exists.
    SignedIn(Session),
    /// The backend sent a confirmation email; no session yet.
    ConfirmationRequired { email: String },
}
