//! Supervisor layer errors.
//!
//! # Error Code Convention
//!
//! All supervisor errors use the `SUPERVISOR_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`NotFound`](SupervisorError::NotFound) | `SUPERVISOR_MODULE_NOT_FOUND` | No |
//! | [`Duplicate`](SupervisorError::Duplicate) | `SUPERVISOR_DUPLICATE_MODULE` | No |
//! | [`LifecycleViolation`](SupervisorError::LifecycleViolation) | `SUPERVISOR_LIFECYCLE_VIOLATION` | Yes |
//! | [`Lane`](SupervisorError::Lane) | `SUPERVISOR_LANE_FAILED` | No |
//! | [`Config`](SupervisorError::Config) | `SUPERVISOR_CONFIG_REJECTED` | Yes |
//!
//! Propagation policy: no supervisor error escapes the dispatcher
//! uncaught — every boundary converts to a logged state change and/or
//! an `error` response.

use crate::config::ConfigError;
use thiserror::Error;
use vigil_module::{ErrorCode, ModuleState};

/// Supervisor layer error.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The named module is not registered.
    #[error("Module not found: {0}")]
    NotFound(String),

    /// A module with the same engine identity is already registered.
    #[error("module already registered: {0}")]
    Duplicate(String),

    /// The operation is not legal in the module's current state.
    ///
    /// Callers treat this as a logged no-op, not a failure.
    #[error("operation '{operation}' not allowed in state {state}")]
    LifecycleViolation {
        /// Requested operation.
        operation: &'static str,
        /// State that forbids it.
        state: ModuleState,
    },

    /// The module's dedicated execution lane could not be created.
    #[error("failed to create execution lane for {engine}: {source}")]
    Lane {
        /// Engine whose lane failed to build.
        engine: String,
        /// Underlying runtime construction error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration delta was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ErrorCode for SupervisorError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "SUPERVISOR_MODULE_NOT_FOUND",
            Self::Duplicate(_) => "SUPERVISOR_DUPLICATE_MODULE",
            Self::LifecycleViolation { .. } => "SUPERVISOR_LIFECYCLE_VIOLATION",
            Self::Lane { .. } => "SUPERVISOR_LANE_FAILED",
            Self::Config(_) => "SUPERVISOR_CONFIG_REJECTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Duplicate(_) | Self::Lane { .. } => false,
            Self::LifecycleViolation { .. } | Self::Config(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_module::assert_error_codes;

    fn all_variants() -> Vec<SupervisorError> {
        vec![
            SupervisorError::NotFound("x".into()),
            SupervisorError::Duplicate("x".into()),
            SupervisorError::LifecycleViolation {
                operation: "stop",
                state: ModuleState::Created,
            },
            SupervisorError::Lane {
                engine: "x".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "x"),
            },
            SupervisorError::Config(ConfigError::InvalidDelta("x".into())),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "SUPERVISOR_");
    }

    #[test]
    fn not_found_message_format() {
        // The dispatcher surfaces this text verbatim to clients.
        let err = SupervisorError::NotFound("m".into());
        assert_eq!(err.to_string(), "Module not found: m");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn lifecycle_violation_recoverable() {
        let err = SupervisorError::LifecycleViolation {
            operation: "update_config",
            state: ModuleState::Running,
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("running"));
    }
}
