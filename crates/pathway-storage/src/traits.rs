//! The key/value seam every storage backend implements.

use crate::StorageResult;

/// String key/value store for session credentials.
///
/// Implementations must be safe to share across tasks; the session store
/// holds one behind a `Box<dyn SecureStorage>`.
pub trait SecureStorage: Send + Sync {
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Remove `key`. `Ok(false)` when it was not present.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
