//! Collaborator seams: the auth backend and the profile store.

use crate::{AuthResult, Profile, Session, SessionListener, SignUpOutcome, SignUpProfile};
use crate::Subscription;
use async_trait::async_trait;

/// Authentication backend.
///
/// Implementations notify subscribed listeners after every session change
/// they cause, including changes discovered while answering
/// [`current_session`](AuthProvider::current_session).
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The session the backend currently considers valid, if any.
    async fn current_session(&self) -> AuthResult<Option<Session>>;

    /// Register a listener for session changes.
    fn subscribe(&self, listener: SessionListener) -> Subscription;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &SignUpProfile,
    ) -> AuthResult<SignUpOutcome>;

    /// End the session. Local credentials are gone afterwards even on error.
    async fn sign_out(&self) -> AuthResult<()>;
}

/// Read access to application profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when no profile row exists; `Err` when the lookup itself failed.
    async fn profile_by_identity(&self, identity_id: &str) -> AuthResult<Option<Profile>>;
}
