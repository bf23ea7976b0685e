//! Errors raised while loading configuration and preparing directories.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting is present but unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid Supabase URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// `config.json` is not valid JSON for [`crate::Config`].
    #[error("Malformed config file: {0}")]
    Json(#[from] serde_json::Error),

    /// No home directory to put `~/.hajj-pathway` in.
    #[error("Cannot resolve application directory: {0}")]
    Path(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
