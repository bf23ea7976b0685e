//! Behavioural tests for the session resolver and the Supabase collaborators.
//!
//! Organization:
//!
//! - `harness.rs`      - Scripted auth provider and profile store
//! - `bootstrap.rs`    - One-shot session query on startup
//! - `events.rs`       - Session change notifications after bootstrap
//! - `ordering.rs`     - Latest signal wins regardless of completion order
//! - `idempotence.rs`  - Repeated signals and repeated calls
//! - `cancellation.rs` - Teardown and drop
//! - `failures.rs`     - Collaborator failures
//! - `supabase.rs`     - Supabase provider and profile store over HTTP

mod idempotence;

use crate::{ResolvedSessionState, Role};
use harness::{identity, resolver, session, ProfileReply, ScriptedAuth, ScriptedProfiles};

/// Basic workflow: bootstrap signed out, sign in, sign out.
#[tokio::test]
async fn basic_workflow() {
    let auth = ScriptedAuth::signed_out();
    let profiles = ScriptedProfiles::new();
    profiles.set("user-1", ProfileReply::Found(Role::Agent), 0);
    auth.accept_credentials(session("user-1"));

    let resolver = resolver(&auth, &profiles);
    assert_eq!(resolver.state(), ResolvedSessionState::Unresolved);

    let state = resolver.initialize().await;
    assert_eq!(state, ResolvedSessionState::Unauthenticated);

    let state = resolver
        .sign_in_with_password("user-1@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(
        state,
        ResolvedSessionState::authenticated(identity("user-1"), Role::Agent)
    );

    let state = resolver.sign_out().await.unwrap();
    assert_eq!(state, ResolvedSessionState::Unauthenticated);
}
