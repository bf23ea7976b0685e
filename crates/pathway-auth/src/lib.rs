//! Session bootstrap and role resolution for Hajj Pathway.
//!
//! This crate provides:
//! - [`SessionResolver`]: turns the auth backend's session signals into a
//!   single, race-free [`ResolvedSessionState`]
//! - An explicit FSM for the resolver's phases
//! - Supabase implementations of the [`AuthProvider`] and [`ProfileStore`] seams
//! - Role-based access policy and dashboard routing

mod access;
mod error;
mod events;
mod profile_store;
mod provider;
mod resolver;
mod resolver_fsm;
mod role;
mod state;
mod supabase_auth;
mod supabase_client;
mod types;

#[cfg(test)]
mod tests;

pub use access::{
    authorize, capabilities, visible_tabs, AccessError, Capability, DashboardView, NavTab,
};
pub use error::{AuthError, AuthResult};
pub use events::{SessionEventHub, SessionListener, Subscription};
pub use profile_store::SupabaseProfileStore;
pub use provider::{AuthProvider, ProfileStore};
pub use resolver::SessionResolver;
pub use resolver_fsm::resolver_machine;
pub use resolver_fsm::{ResolverInput, ResolverMachine, ResolverPhase};
pub use role::{Role, UnknownRole};
pub use state::{ResolvedSessionState, SessionStateReader, SessionSummary};
pub use supabase_auth::SupabaseAuthProvider;
pub use supabase_client::{project_ref_from_supabase_url, SignUpReply, SupabaseClient};
pub use types::{
    AuthenticatedIdentity, Profile, Session, SessionEvent, SignUpOutcome, SignUpProfile,
};
