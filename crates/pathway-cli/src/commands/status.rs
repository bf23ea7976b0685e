//! Session status and live watch.

use super::Pathway;
use crate::output::{self, OutputFormat, SessionReport};
use anyhow::Result;
use pathway_auth::{AuthProvider, SessionEvent};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolve the session once and print it.
pub async fn status(pathway: &Pathway, format: &OutputFormat) -> Result<()> {
    let state = pathway.resolver.initialize().await;
    output::print(&SessionReport::from(&state), format);
    Ok(())
}

/// Print the resolved session, then every change until Ctrl-C.
///
/// The stored session is re-checked every `interval`, which refreshes
/// expiring tokens and notices sign-outs made by another process.
pub async fn watch(pathway: &Pathway, interval: Duration, format: &OutputFormat) -> Result<()> {
    let mut reader = pathway.resolver.reader();
    let state = pathway.resolver.initialize().await;
    reader.mark_seen();
    output::print(&SessionReport::from(&state), format);

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            changed = reader.changed() => match changed {
                Some(state) => output::print(&SessionReport::from(&state), format),
                None => break,
            },
            _ = ticker.tick() => recheck(pathway).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
        }
    }

    pathway.resolver.teardown();
    Ok(())
}

async fn recheck(pathway: &Pathway) {
    match pathway.auth.current_session().await {
        Ok(session) => {
            debug!(has_session = session.is_some(), "Re-checked stored session");
            let event = if session.is_some() {
                SessionEvent::UserUpdated
            } else {
                SessionEvent::SignedOut
            };
            pathway.resolver.on_session_changed(event, session).await;
        }
        // Same rule as the startup query: an unreadable session is no session.
        Err(e) => {
            warn!(error = %e, "Session re-check failed, treating as signed out");
            pathway
                .resolver
                .on_session_changed(SessionEvent::SignedOut, None)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use pathway_auth::{
        project_ref_from_supabase_url, AuthenticatedIdentity, ResolvedSessionState, Role, Session,
        SessionResolver, SupabaseAuthProvider, SupabaseClient, SupabaseProfileStore,
    };
    use pathway_storage::{MemoryStorage, SecureStorage, SessionStore, StorageKeys};
    use std::sync::Arc;

    /// A pathway whose backend refuses connections and whose stored
    /// session record is `record`.
    async fn offline_pathway(record: Option<serde_json::Value>) -> Pathway {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let client = SupabaseClient::new(base_url, "anon-key", Duration::from_secs(2)).unwrap();

        let storage = MemoryStorage::new();
        if let Some(record) = record {
            storage.set(StorageKeys::SESSION, &record.to_string()).unwrap();
        }
        let store = Arc::new(SessionStore::new(Box::new(storage), client.project_ref()));
        let auth = Arc::new(SupabaseAuthProvider::new(client.clone(), store.clone()));
        let profiles = Arc::new(SupabaseProfileStore::new(client, store));
        let resolver = SessionResolver::new(auth.clone(), profiles);
        Pathway { auth, resolver }
    }

    async fn sign_in_u1(pathway: &Pathway) {
        let session = Session {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
            user: AuthenticatedIdentity::new("u1", None),
        };
        let state = pathway
            .resolver
            .on_session_changed(SessionEvent::SignedIn, Some(session))
            .await;
        assert_eq!(state.role(), Some(Role::Pilgrim));
    }

    #[tokio::test]
    async fn test_recheck_signs_out_on_unreadable_session() {
        let project_ref = project_ref_from_supabase_url("http://127.0.0.1");
        let pathway = offline_pathway(Some(serde_json::json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "meta": {
                "user_id": "u1",
                "expires_at": "not a timestamp",
                "project_ref": project_ref,
            }
        })))
        .await;
        sign_in_u1(&pathway).await;

        recheck(&pathway).await;

        assert_eq!(pathway.resolver.state(), ResolvedSessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_recheck_signs_out_when_session_is_gone() {
        let pathway = offline_pathway(None).await;
        sign_in_u1(&pathway).await;

        recheck(&pathway).await;

        assert_eq!(pathway.resolver.state(), ResolvedSessionState::Unauthenticated);
    }
}
