//! Module layer errors and the unified error code interface.
//!
//! Every error type in the workspace implements [`ErrorCode`] so that
//! callers can branch on a stable machine-readable code instead of
//! matching display strings.
//!
//! # Error Code Convention
//!
//! All module errors use the `MODULE_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`Config`](ModuleError::Config) | `MODULE_CONFIG_INVALID` | Yes |
//! | [`Execution`](ModuleError::Execution) | `MODULE_EXECUTION_FAILED` | Yes |
//! | [`Notify`](ModuleError::Notify) | `MODULE_NOTIFY_FAILED` | Yes |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error code interface for Vigil errors.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**: e.g. `"MODULE_CONFIG_INVALID"`
/// - **Namespace-prefixed**: `MODULE_`, `SUPERVISOR_`, `CONFIG_`
/// - **Stable**: codes are an API contract and must not change
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows workspace conventions.
///
/// # Panics
///
/// Panics with a descriptive message if the code is empty, lacks the
/// expected prefix, or is not UPPER_SNAKE_CASE.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates all variants of an error enum at once.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Module layer error.
///
/// Raised by [`Module`](crate::Module) implementations during
/// `initialize`, `run` or `terminate`. The supervisor catches every
/// variant at the lane boundary and converts it to a state transition;
/// a module error can never crash the host process.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ModuleError {
    /// Invalid or missing module configuration.
    ///
    /// Raised at `initialize` time when a required field is absent or
    /// malformed. The module stays in its prior state.
    #[error("invalid module configuration: {0}")]
    Config(String),

    /// The module's main loop hit an unrecoverable fault.
    ///
    /// The supervisor transitions the module to `Failed` and attempts a
    /// best-effort `terminate()`.
    #[error("module execution failed: {0}")]
    Execution(String),

    /// A notification could not be delivered.
    #[error("notification failed: {0}")]
    Notify(String),
}

impl ErrorCode for ModuleError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "MODULE_CONFIG_INVALID",
            Self::Execution(_) => "MODULE_EXECUTION_FAILED",
            Self::Notify(_) => "MODULE_NOTIFY_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // All module errors may clear up after reconfiguration or retry.
        true
    }
}
