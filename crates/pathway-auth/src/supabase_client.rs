//! Supabase Auth (GoTrue) and REST client.
//!
//! Thin request/response layer: no state, no persistence, no events. The
//! provider and profile store build on top of it.

use crate::{AuthError, AuthResult, AuthenticatedIdentity, Profile, Role, Session, SignUpProfile};
use chrono::{Duration, Utc};
use pathway_config_and_utils::Config;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};
use url::Url;

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Derive the project ref (`abcd` in `https://abcd.supabase.co`).
pub fn project_ref_from_supabase_url(supabase_url: &str) -> String {
    Url::parse(supabase_url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .and_then(|host| host.split('.').next().map(str::to_string))
        .filter(|project_ref| !project_ref.is_empty())
        .unwrap_or_else(|| "default".to_string())
}

#[derive(Debug, Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

/// Stored as `raw_user_meta_data`; the profiles trigger reads these names.
#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    username: &'a str,
    user_type: Role,
}

/// Token endpoint response (password and refresh grants).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            user: AuthenticatedIdentity::new(self.user.id, self.user.email),
        }
    }
}

/// Sign-up returns a full token response when the project auto-confirms
/// and a bare user object when a confirmation email was sent.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(UserResponse),
}

/// Result of [`SupabaseClient::sign_up`].
#[derive(Debug)]
pub enum SignUpReply {
    Session(Session),
    PendingConfirmation { email: Option<String> },
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    user_type: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            role: Role::from_profile_value(row.user_type.as_deref()),
            identity_id: row.id,
            display_name: row.username,
        }
    }
}

/// Supabase client for auth and profile requests.
#[derive(Clone)]
pub struct SupabaseClient {
    http_client: reqwest::Client,
    api_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project API URL (e.g., `https://xyz.supabase.co`)
    /// * `anon_key` - The Supabase publishable (anon) key
    /// * `timeout` - Applied to every request
    pub fn new(
        api_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: std::time::Duration,
    ) -> AuthResult<Self> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Url::parse(&api_url)?;
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_url,
            anon_key: anon_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> AuthResult<Self> {
        let api_url = config.supabase_url()?;
        Self::new(
            api_url.as_str(),
            config.supabase_publishable_key.clone(),
            config.request_timeout(),
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub fn project_ref(&self) -> String {
        project_ref_from_supabase_url(&self.api_url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url, path)
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    fn profile_url(&self, identity_id: &str) -> AuthResult<Url> {
        let mut url = Url::parse(&self.rest_url("profiles"))?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", identity_id))
            .append_pair("select", "id,username,user_type")
            .append_pair("limit", "1");
        Ok(url)
    }

    /// Read a non-success response body and log a digest of it.
    async fn failure_body(response: reqwest::Response, what: &str) -> (u16, String) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(
            status = %status,
            body_summary = %summarize_response_body(&body),
            "{} failed", what
        );
        (status.as_u16(), gotrue_message(&body).unwrap_or(body))
    }

    /// Password grant.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        let url = self.auth_url("token?grant_type=password");
        debug!(url = %url, email = %email, "Attempting email/password sign-in");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrantRequest { email, password })
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        if !response.status().is_success() {
            let (status, message) = Self::failure_body(response, "Password sign-in").await;
            return Err(if status >= 500 {
                AuthError::Api { status, message }
            } else {
                AuthError::InvalidCredentials(message)
            });
        }

        let data: TokenResponse = response.json().await?;
        Ok(data.into_session())
    }

    /// Refresh-token grant. Single attempt.
    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<Session> {
        let url = self.auth_url("token?grant_type=refresh_token");
        debug!(url = %url, "Refreshing token");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        if !response.status().is_success() {
            let (status, message) = Self::failure_body(response, "Token refresh").await;
            return Err(AuthError::TokenRefresh(format!("HTTP {}: {}", status, message)));
        }

        let data: TokenResponse = response.json().await?;
        Ok(data.into_session())
    }

    /// Create an account with profile metadata.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &SignUpProfile,
    ) -> AuthResult<SignUpReply> {
        let url = self.auth_url("signup");
        debug!(url = %url, email = %email, role = %profile.role, "Attempting sign-up");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&SignUpRequest {
                email,
                password,
                data: SignUpMetadata {
                    username: profile.username.trim(),
                    user_type: profile.role,
                },
            })
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        if !response.status().is_success() {
            let (status, message) = Self::failure_body(response, "Sign-up").await;
            return Err(if status >= 500 {
                AuthError::Api { status, message }
            } else {
                AuthError::InvalidInput(message)
            });
        }

        match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(data) => Ok(SignUpReply::Session(data.into_session())),
            SignUpResponse::User(user) => Ok(SignUpReply::PendingConfirmation { email: user.email }),
        }
    }

    /// Revoke the session server-side.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .http_client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        if !response.status().is_success() {
            let (status, message) = Self::failure_body(response, "Sign-out").await;
            return Err(AuthError::Api { status, message });
        }
        Ok(())
    }

    /// Fetch the profile row for `identity_id`.
    ///
    /// `bearer` is the user's access token; the anon key is used when absent,
    /// which only succeeds if row-level security allows anonymous reads.
    pub async fn fetch_profile(
        &self,
        identity_id: &str,
        bearer: Option<&str>,
    ) -> AuthResult<Option<Profile>> {
        let url = self.profile_url(identity_id)?;
        debug!(identity_id, "Fetching profile");

        let response = self
            .http_client
            .get(url)
            .header("apikey", &self.anon_key)
            .header(
                "Authorization",
                format!("Bearer {}", bearer.unwrap_or(&self.anon_key)),
            )
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        if !response.status().is_success() {
            let (status, message) = Self::failure_body(response, "Profile fetch").await;
            return Err(AuthError::ProfileLookup(format!("HTTP {}: {}", status, message)));
        }

        let rows: Vec<ProfileRow> = response.json().await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }
}

/// Pull the human-readable message out of a GoTrue / PostgREST error body.
fn gotrue_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key)?.as_str().map(str::to_string))
}
