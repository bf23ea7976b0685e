//! Tracing setup for the Hajj Pathway binaries.
//!
//! A binary calls [`init_with_config`] once; everything else just uses the
//! `tracing` macros. With the default `dev` feature each event is appended
//! as one JSON object to `~/.hajj-pathway/logs/dev.jsonl` (or
//! [`LogConfig::log_path`]), with credential-looking fields redacted.
//! Without it a compact stderr formatter is installed.

#[cfg(feature = "dev")]
mod dev;
#[cfg(feature = "dev")]
mod json_layer;

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written into every line as `service`.
    pub service_name: String,

    /// Filter used when `RUST_LOG` is unset.
    pub default_level: String,

    /// Overrides the dev log file location.
    pub log_path: Option<PathBuf>,

    /// Mirror events to stderr as well as the log file.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Install the global subscriber. Later calls in the same process are
/// ignored.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    dev::init_dev_subscriber(&config);

    #[cfg(not(feature = "dev"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .finish()
            .try_init();
    }
}
