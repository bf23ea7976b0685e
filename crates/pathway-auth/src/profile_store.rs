//! [`ProfileStore`] backed by the Supabase `profiles` table.

use crate::{AuthResult, Profile, ProfileStore, SupabaseClient};
use async_trait::async_trait;
use pathway_storage::SessionStore;
use std::sync::Arc;

/// Reads `profiles` with the stored access token (anon key when signed out).
pub struct SupabaseProfileStore {
    client: SupabaseClient,
    store: Arc<SessionStore>,
}

impl SupabaseProfileStore {
    pub fn new(client: SupabaseClient, store: Arc<SessionStore>) -> Self {
        Self { client, store }
    }
}

#[async_trait]
impl ProfileStore for SupabaseProfileStore {
    async fn profile_by_identity(&self, identity_id: &str) -> AuthResult<Option<Profile>> {
        let access_token = self.store.get_access_token()?;
        self.client
            .fetch_profile(identity_id, access_token.as_deref())
            .await
    }
}
