//! Repeated signals and repeated calls.

use super::harness::{identity, resolver, session, ProfileReply, ScriptedAuth, ScriptedProfiles};
use crate::{ResolvedSessionState, Role, SessionEvent};

#[tokio::test]
async fn duplicate_sign_in_does_not_look_up_again() {
    let auth = ScriptedAuth::signed_out();
    let profiles = ScriptedProfiles::new();
    profiles.set("user-1", ProfileReply::Found(Role::Agent), 0);
    let resolver = resolver(&auth, &profiles);
    resolver.initialize().await;

    let first = resolver
        .on_session_changed(SessionEvent::SignedIn, Some(session("user-1")))
        .await;
    let mut reader = resolver.reader();
    let second = resolver
        .on_session_changed(SessionEvent::SignedIn, Some(session("user-1")))
        .await;

    assert_eq!(first, second);
    assert_eq!(profiles.lookups(), 1);
    assert!(!reader.has_changed());
    assert_eq!(reader.mark_seen(), first);
}

#[tokio::test]
async fn token_refresh_for_same_identity_is_ignored() {
    let auth = ScriptedAuth::signed_in(session("user-1"));
    let profiles = ScriptedProfiles::new();
    profiles.set("user-1", ProfileReply::Found(Role::Admin), 0);
    let resolver = resolver(&auth, &profiles);
    resolver.initialize().await;
    let reader = resolver.reader();

    let mut refreshed = session("user-1");
    refreshed.access_token = "access-rotated".to_string();
    auth.emit(SessionEvent::TokenRefreshed, Some(refreshed));
    tokio::task::yield_now().await;

    assert_eq!(profiles.lookups(), 1);
    assert!(!reader.has_changed());
    assert_eq!(
        resolver.state(),
        ResolvedSessionState::authenticated(identity("user-1"), Role::Admin)
    );
}

#[tokio::test]
async fn password_sign_in_looks_up_once() {
    let auth = ScriptedAuth::signed_out();
    auth.accept_credentials(session("user-1"));
    let profiles = ScriptedProfiles::new();
    profiles.set("user-1", ProfileReply::Found(Role::Agent), 10);
    let resolver = resolver(&auth, &profiles);
    resolver.initialize().await;

    // The provider's announcement and the direct call carry the same identity.
    let state = resolver
        .sign_in_with_password("user-1@example.com", "secret")
        .await
        .unwrap();

    assert_eq!(state.role(), Some(Role::Agent));
    assert_eq!(profiles.lookups(), 1);
}

#[tokio::test]
async fn repeated_sign_out_notifies_once() {
    let auth = ScriptedAuth::signed_in(session("user-1"));
    let profiles = ScriptedProfiles::new();
    let resolver = resolver(&auth, &profiles);
    resolver.initialize().await;
    let mut reader = resolver.reader();

    auth.emit(SessionEvent::SignedOut, None);
    assert!(reader.has_changed());
    assert_eq!(reader.mark_seen(), ResolvedSessionState::Unauthenticated);

    auth.emit(SessionEvent::SignedOut, None);
    assert!(!reader.has_changed());
}

#[tokio::test]
async fn same_identity_after_sign_out_is_looked_up_again() {
    let auth = ScriptedAuth::signed_out();
    let profiles = ScriptedProfiles::new();
    profiles.set("user-1", ProfileReply::Found(Role::Agent), 0);
    let resolver = resolver(&auth, &profiles);
    resolver.initialize().await;

    resolver
        .on_session_changed(SessionEvent::SignedIn, Some(session("user-1")))
        .await;
    resolver.on_session_changed(SessionEvent::SignedOut, None).await;
    profiles.set("user-1", ProfileReply::Found(Role::Admin), 0);
    let state = resolver
        .on_session_changed(SessionEvent::SignedIn, Some(session("user-1")))
        .await;

    assert_eq!(profiles.lookups(), 2);
    assert_eq!(state.role(), Some(Role::Admin));
}
