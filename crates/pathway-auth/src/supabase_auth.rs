//! [`AuthProvider`] backed by Supabase Auth with a locally persisted session.

use crate::{
    AuthError, AuthProvider, AuthResult, AuthenticatedIdentity, Session, SessionEvent,
    SessionEventHub, SessionListener, SignUpOutcome, SignUpProfile, SignUpReply, Subscription,
    SupabaseClient,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use pathway_storage::{SessionStore, StoredSession, EXPIRY_MARGIN_SECS};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Supabase-backed auth provider.
///
/// Every session change it makes is persisted first and then announced on
/// its [`SessionEventHub`].
pub struct SupabaseAuthProvider {
    client: SupabaseClient,
    store: Arc<SessionStore>,
    hub: Arc<SessionEventHub>,
}

impl SupabaseAuthProvider {
    pub fn new(client: SupabaseClient, store: Arc<SessionStore>) -> Self {
        Self {
            client,
            store,
            hub: SessionEventHub::new(),
        }
    }

    pub fn hub(&self) -> &Arc<SessionEventHub> {
        &self.hub
    }

    fn persist(&self, session: &Session) -> AuthResult<()> {
        self.store.set_session(
            &session.access_token,
            &session.refresh_token,
            &session.user.id,
            session.user.email.as_deref(),
            session.expires_at,
        )?;
        Ok(())
    }

    fn restore(stored: StoredSession) -> AuthResult<Session> {
        let expires_at = stored
            .meta
            .expires_at_utc()
            .map_err(|e| AuthError::SessionInvalid(e.to_string()))?;
        Ok(Session {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires_at,
            user: AuthenticatedIdentity::new(stored.meta.user_id, stored.meta.email),
        })
    }

    fn needs_refresh(session: &Session) -> bool {
        session.is_expired_at(Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS))
    }

    fn require_non_empty(value: &str, field: &str) -> AuthResult<()> {
        if value.trim().is_empty() {
            return Err(AuthError::InvalidInput(format!("{} must not be empty", field)));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    /// Load the persisted session, refreshing it once if it has expired.
    ///
    /// A failed refresh clears the session, announces `SignedOut`, and
    /// returns the refresh error.
    async fn current_session(&self) -> AuthResult<Option<Session>> {
        let Some(stored) = self.store.load_session()? else {
            debug!("No stored session");
            return Ok(None);
        };

        let session = Self::restore(stored)?;
        if !Self::needs_refresh(&session) {
            return Ok(Some(session));
        }

        info!(user_id = %session.user.id, "Stored session expired, attempting refresh");
        match self.client.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => {
                self.persist(&refreshed)?;
                info!(user_id = %refreshed.user.id, "Token refreshed successfully");
                self.hub.emit(SessionEvent::TokenRefreshed, Some(&refreshed));
                Ok(Some(refreshed))
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, clearing session");
                self.store.clear_session()?;
                self.hub.emit(SessionEvent::SignedOut, None);
                Err(e)
            }
        }
    }

    fn subscribe(&self, listener: SessionListener) -> Subscription {
        self.hub.subscribe(listener)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        Self::require_non_empty(email, "email")?;
        Self::require_non_empty(password, "password")?;

        let session = self.client.sign_in_with_password(email.trim(), password).await?;
        self.persist(&session)?;
        info!(user_id = %session.user.id, "Password sign-in succeeded");
        self.hub.emit(SessionEvent::SignedIn, Some(&session));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &SignUpProfile,
    ) -> AuthResult<SignUpOutcome> {
        Self::require_non_empty(email, "email")?;
        Self::require_non_empty(password, "password")?;
        Self::require_non_empty(&profile.username, "username")?;

        let email = email.trim();
        match self.client.sign_up(email, password, profile).await? {
            SignUpReply::Session(session) => {
                self.persist(&session)?;
                info!(user_id = %session.user.id, role = %profile.role, "Sign-up completed with session");
                self.hub.emit(SessionEvent::SignedIn, Some(&session));
                Ok(SignUpOutcome::SignedIn(session))
            }
            SignUpReply::PendingConfirmation { email: confirmed } => {
                info!(role = %profile.role, "Sign-up pending email confirmation");
                Ok(SignUpOutcome::ConfirmationRequired {
                    email: confirmed.unwrap_or_else(|| email.to_string()),
                })
            }
        }
    }

    /// Revoke remotely when possible; always clear locally.
    async fn sign_out(&self) -> AuthResult<()> {
        if let Some(access_token) = self.store.get_access_token()? {
            if let Err(e) = self.client.sign_out(&access_token).await {
                warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
            }
        }

        let cleared = self.store.clear_session()?;
        debug!(cleared, "Local session cleared");
        self.hub.emit(SessionEvent::SignedOut, None);
        Ok(())
    }
}
