//! Session persistence for the Hajj Pathway tools.
//!
//! Credentials live behind the [`SecureStorage`] key/value trait:
//! - [`FileStorage`]: a JSON map on disk, owner-only permissions on Unix
//! - [`MemoryStorage`]: process-local, for tests and ephemeral runs
//!
//! [`SessionStore`] layers the session schema (tokens plus metadata) on top.

mod file;
mod keys;
mod memory;
mod session_store;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session_store::{SessionMeta, SessionStore, StoredSession, EXPIRY_MARGIN_SECS};
pub use traits::SecureStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A stored value (or the storage file itself) could not be decoded.
    #[error("Stored data is unreadable: {0}")]
    Encoding(String),

    #[error("Storage IO failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
