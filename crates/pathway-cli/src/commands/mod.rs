//! CLI command implementations.

mod auth;
mod status;

pub use auth::{login, logout, signup};
pub use status::{status, watch};

use anyhow::{Context, Result};
use pathway_auth::{SessionResolver, SupabaseAuthProvider, SupabaseClient, SupabaseProfileStore};
use pathway_config_and_utils::{Config, Paths};
use pathway_storage::{FileStorage, SessionStore};
use std::sync::Arc;
use tracing::debug;

/// Collaborators wired for one CLI invocation.
pub struct Pathway {
    pub auth: Arc<SupabaseAuthProvider>,
    pub resolver: SessionResolver,
}

impl Pathway {
    /// Build the Supabase-backed resolver with the session persisted at
    /// `paths.session_file()`.
    pub fn connect(config: &Config, paths: &Paths) -> Result<Self> {
        paths.ensure_dirs()?;

        let client = SupabaseClient::from_config(config).context("Invalid Supabase settings")?;
        let storage = FileStorage::open(paths.session_file())?;
        debug!(
            session_file = %storage.path().display(),
            project_ref = %client.project_ref(),
            "Opening session store"
        );
        let store = Arc::new(SessionStore::new(Box::new(storage), client.project_ref()));

        let auth = Arc::new(SupabaseAuthProvider::new(client.clone(), store.clone()));
        let profiles = Arc::new(SupabaseProfileStore::new(client, store));
        let resolver = SessionResolver::new(auth.clone(), profiles);

        Ok(Self { auth, resolver })
    }
}
