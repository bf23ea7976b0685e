//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Request rejected before reaching the backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Token refresh error
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Persisted session could not be restored
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// Profile query failed (distinct from "no profile row")
    #[error("Profile lookup failed: {0}")]
    ProfileLookup(String),

    /// Backend answered with a non-success status
    #[error("Backend returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] pathway_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Network unavailable (transient error, can retry)
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Classify a failed request: timeouts and refused connections get
    /// their own variants, everything else stays an HTTP error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout
        } else if err.is_connect() {
            AuthError::NetworkUnavailable
        } else {
            AuthError::Http(err)
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Network unavailable
    /// - HTTP errors with 5xx status codes
    /// - Connection timeouts
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::NetworkUnavailable => true,
            AuthError::Timeout => true,
            AuthError::Api { status, .. } => *status >= 500,
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }
}

impl From<pathway_config_and_utils::CoreError> for AuthError {
    fn from(err: pathway_config_and_utils::CoreError) -> Self {
        AuthError::Config(err.to_string())
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_network_unavailable() {
        assert!(AuthError::NetworkUnavailable.is_transient());
    }

    #[test]
    fn test_is_transient_timeout() {
        assert!(AuthError::Timeout.is_transient());
    }

    #[test]
    fn test_api_error_transient_only_for_server_errors() {
        let server = AuthError::Api {
            status: 503,
            message: "unavailable".into(),
        };
        let client = AuthError::Api {
            status: 404,
            message: "missing".into(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
    }

    #[test]
    fn test_is_not_transient_invalid_credentials() {
        assert!(!AuthError::InvalidCredentials("bad password".to_string()).is_transient());
    }

    #[test]
    fn test_is_not_transient_session_invalid() {
        assert!(!AuthError::SessionInvalid("revoked".to_string()).is_transient());
    }

    #[test]
    fn test_core_error_maps_to_config() {
        let err: AuthError =
            pathway_config_and_utils::CoreError::Config("bad timeout".into()).into();
        assert!(matches!(err, AuthError::Config(msg) if msg.contains("bad timeout")));
    }
}
