//! Configuration layer errors.

use thiserror::Error;
use vigil_module::ErrorCode;

/// Configuration loading or update error.
///
/// All variants use the `CONFIG_` code prefix.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed as TOML.
    #[error("failed to parse config file {path}: {message}")]
    Parse {
        /// File path.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A runtime JSON delta was malformed or produced an invalid config.
    #[error("invalid configuration delta: {0}")]
    InvalidDelta(String),

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar {
        /// Variable name.
        var: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CONFIG_IO_FAILED",
            Self::Parse { .. } => "CONFIG_PARSE_FAILED",
            Self::InvalidDelta(_) => "CONFIG_INVALID_DELTA",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Every config error clears up once the file/delta/env is fixed.
        true
    }
}
