//! Process host errors.

use thiserror::Error;
use vigil_module::ErrorCode;
use vigil_runtime::ConfigError;

/// Fatal error during host startup or serving.
///
/// All variants use the `SERVER_` code prefix. These abort the
/// process; nothing here is surfaced to API clients.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The executor pool could not be constructed.
    #[error("executor pool initialization failed: {0}")]
    Pool(#[source] std::io::Error),

    /// The listener socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested bind address.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server failed while serving.
    #[error("http server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl ErrorCode for ServerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "SERVER_CONFIG_INVALID",
            Self::Pool(_) => "SERVER_POOL_INIT_FAILED",
            Self::Bind { .. } => "SERVER_BIND_FAILED",
            Self::Serve(_) => "SERVER_SERVE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_module::assert_error_codes;

    #[test]
    fn all_error_codes_valid() {
        let variants = vec![
            ServerError::Config(ConfigError::InvalidDelta("x".into())),
            ServerError::Pool(std::io::Error::new(std::io::ErrorKind::Other, "x")),
            ServerError::Bind {
                addr: "127.0.0.1:8462".into(),
                source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "x"),
            },
            ServerError::Serve(std::io::Error::new(std::io::ErrorKind::Other, "x")),
        ];
        assert_error_codes(&variants, "SERVER_");
    }
}
