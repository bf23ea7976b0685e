//! Storage key constants.

/// Storage keys used for the persisted session
pub struct StorageKeys;

impl StorageKeys {
    /// The whole Supabase session (tokens plus metadata) as one JSON value.
    ///
    /// Tokens and the identity they belong to must change together, so
    /// they are never split across keys.
    pub const SESSION: &'static str = "supabase_session";
}
