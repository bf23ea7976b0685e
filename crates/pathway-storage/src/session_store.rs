//! Persisted Supabase session: two tokens plus metadata, stored as one record.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A session is treated as expired this many seconds before `expires_at`.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Session metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    /// User ID from Supabase Auth
    pub user_id: String,
    /// User email from Supabase Auth
    #[serde(default)]
    pub email: Option<String>,
    /// When the access token expires (RFC 3339)
    pub expires_at: String,
    /// Supabase project reference the tokens belong to
    pub project_ref: String,
}

impl SessionMeta {
    pub fn expires_at_utc(&self) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.expires_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StorageError::Encoding(format!("expires_at: {}", e)))
    }
}

/// Everything needed to rebuild a session.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub meta: SessionMeta,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("meta", &self.meta)
            .finish()
    }
}

/// Typed access to the session record of a [`SecureStorage`] backend.
///
/// The record lives under the single key [`StorageKeys::SESSION`], so one
/// `set` replaces tokens and metadata together or not at all.
pub struct SessionStore {
    storage: Box<dyn SecureStorage>,
    project_ref: String,
}

impl SessionStore {
    pub fn new(storage: Box<dyn SecureStorage>, project_ref: impl Into<String>) -> Self {
        Self {
            storage,
            project_ref: project_ref.into(),
        }
    }

    pub fn project_ref(&self) -> &str {
        &self.project_ref
    }

    /// Access token of the stored session, if one is stored for this project.
    pub fn get_access_token(&self) -> StorageResult<Option<String>> {
        Ok(self.load_session()?.map(|session| session.access_token))
    }

    pub fn has_session(&self) -> StorageResult<bool> {
        Ok(self.load_session()?.is_some())
    }

    /// Store a complete session (tokens + metadata).
    pub fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: &str,
        email: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let record = StoredSession {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            meta: SessionMeta {
                user_id: user_id.to_string(),
                email: email.map(String::from),
                expires_at: expires_at.to_rfc3339(),
                project_ref: self.project_ref.clone(),
            },
        };
        let json =
            serde_json::to_string(&record).map_err(|e| StorageError::Encoding(e.to_string()))?;

        self.storage.set(StorageKeys::SESSION, &json)?;
        tracing::debug!(user_id, project_ref = %self.project_ref, "Stored session");
        Ok(())
    }

    /// Load the stored session.
    ///
    /// A session written for a different project is reported as absent
    /// rather than as an error.
    pub fn load_session(&self) -> StorageResult<Option<StoredSession>> {
        let Some(json) = self.storage.get(StorageKeys::SESSION)? else {
            return Ok(None);
        };
        let session: StoredSession =
            serde_json::from_str(&json).map_err(|e| StorageError::Encoding(e.to_string()))?;

        if session.meta.project_ref != self.project_ref {
            tracing::warn!(
                stored = %session.meta.project_ref,
                expected = %self.project_ref,
                "Ignoring session stored for another project"
            );
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Remove the stored session. Returns whether anything was removed.
    pub fn clear_session(&self) -> StorageResult<bool> {
        let removed = self.storage.delete(StorageKeys::SESSION)?;
        if removed {
            tracing::debug!(project_ref = %self.project_ref, "Cleared stored session");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStorage, MemoryStorage};
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn store() -> SessionStore {
        SessionStore::new(Box::new(MemoryStorage::new()), "abcd")
    }

    /// Memory backend whose writes can be switched off.
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: Arc<AtomicBool>,
    }

    impl SecureStorage for FlakyStorage {
        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key)
        }

        fn delete(&self, key: &str) -> StorageResult<bool> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn test_set_and_load_session() {
        let store = store();
        let expires_at = Utc::now() + Duration::hours(1);

        store
            .set_session("access", "refresh", "user-1", Some("a@example.com"), expires_at)
            .unwrap();

        assert!(store.has_session().unwrap());
        assert_eq!(store.get_access_token().unwrap().as_deref(), Some("access"));

        let session = store.load_session().unwrap().unwrap();
        assert_eq!(session.access_token, "access");
        assert_eq!(session.refresh_token, "refresh");
        assert_eq!(session.meta.user_id, "user-1");
        assert_eq!(session.meta.email.as_deref(), Some("a@example.com"));
        assert_eq!(session.meta.project_ref, "abcd");
        assert_eq!(
            session.meta.expires_at_utc().unwrap().timestamp(),
            expires_at.timestamp()
        );
    }

    #[test]
    fn test_missing_session() {
        let store = store();
        assert!(!store.has_session().unwrap());
        assert!(store.get_access_token().unwrap().is_none());
        assert!(store.load_session().unwrap().is_none());
    }

    #[test]
    fn test_failed_write_keeps_previous_session_whole() {
        let fail_writes = Arc::new(AtomicBool::new(false));
        let store = SessionStore::new(
            Box::new(FlakyStorage {
                inner: MemoryStorage::new(),
                fail_writes: fail_writes.clone(),
            }),
            "abcd",
        );
        let expires_at = Utc::now() + Duration::hours(1);
        store
            .set_session("access-A", "refresh-A", "user-A", None, expires_at)
            .unwrap();

        fail_writes.store(true, Ordering::SeqCst);
        assert!(store
            .set_session("access-B", "refresh-B", "user-B", None, expires_at)
            .is_err());

        let session = store.load_session().unwrap().unwrap();
        assert_eq!(session.access_token, "access-A");
        assert_eq!(session.refresh_token, "refresh-A");
        assert_eq!(session.meta.user_id, "user-A");
    }

    #[test]
    fn test_replacing_session_swaps_tokens_and_identity_together() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(Box::new(FileStorage::open(&path).unwrap()), "abcd");
        let expires_at = Utc::now() + Duration::hours(1);

        store
            .set_session("access-A", "refresh-A", "user-A", None, expires_at)
            .unwrap();
        store
            .set_session("access-B", "refresh-B", "user-B", None, expires_at)
            .unwrap();

        let reopened = SessionStore::new(Box::new(FileStorage::open(&path).unwrap()), "abcd");
        let session = reopened.load_session().unwrap().unwrap();
        assert_eq!(session.access_token, "access-B");
        assert_eq!(session.meta.user_id, "user-B");
    }

    #[test]
    fn test_corrupt_record_is_an_encoding_error() {
        let storage = MemoryStorage::new();
        storage.set(StorageKeys::SESSION, "{\"access_token\":").unwrap();
        let store = SessionStore::new(Box::new(storage), "abcd");

        assert!(matches!(store.load_session(), Err(StorageError::Encoding(_))));
    }

    #[test]
    fn test_session_for_other_project_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        SessionStore::new(Box::new(FileStorage::open(&path).unwrap()), "project-a")
            .set_session("a", "r", "user-1", None, Utc::now() + Duration::hours(1))
            .unwrap();

        let other = SessionStore::new(Box::new(FileStorage::open(&path).unwrap()), "project-b");
        assert!(other.load_session().unwrap().is_none());
        assert!(other.get_access_token().unwrap().is_none());
    }

    #[test]
    fn test_clear_session() {
        let store = store();
        store
            .set_session("a", "r", "user-1", None, Utc::now() + Duration::hours(1))
            .unwrap();

        assert!(store.clear_session().unwrap());
        assert!(!store.clear_session().unwrap());
        assert!(store.load_session().unwrap().is_none());
    }

    #[test]
    fn test_meta_without_email_deserializes() {
        let json = r#"{"user_id":"u","expires_at":"2030-01-01T00:00:00Z","project_ref":"p"}"#;
        let meta: SessionMeta = serde_json::from_str(json).unwrap();
        assert!(meta.email.is_none());
    }

    #[test]
    fn test_stored_session_debug_redacts_tokens() {
        let session = StoredSession {
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
            meta: SessionMeta {
                user_id: "u".into(),
                email: None,
                expires_at: "2030-01-01T00:00:00Z".into(),
                project_ref: "p".into(),
            },
        };
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }
}
