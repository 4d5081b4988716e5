//! Command dispatcher: structured request in, structured response out.
//!
//! Stateless, transport-agnostic mapping from a command envelope onto
//! supervisor operations. Every error path is caught and converted to
//! a `status: error` response carrying the original correlation id —
//! nothing throws across the dispatch boundary.
//!
//! # Envelope
//!
//! ```json
//! {
//!   "requestType": "command",
//!   "operation": "start",
//!   "module": "heartbeat",
//!   "metadata": { "requestId": "abc-123" }
//! }
//! ```
//!
//! Responses carry `status` (`success`|`error`), a human-readable
//! `message`, and the echoed `requestId`.

use crate::error::SupervisorError;
use crate::supervisor::Supervisor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use vigil_module::ErrorCode;

/// Inbound command envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    /// `command` or `configure`.
    pub request_type: String,

    /// `start`, `stop`, or `modify`.
    pub operation: String,

    /// Optional grouping tag, carried but not interpreted.
    #[serde(default)]
    pub module_group: Option<String>,

    /// Target engine name.
    #[serde(default)]
    pub module: Option<String>,

    /// Free-form payload.
    #[serde(default)]
    pub payload: Option<Value>,

    /// Correlation metadata.
    #[serde(default)]
    pub metadata: Option<RequestMetadata>,
}

/// Correlation metadata attached to a request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    /// Correlation id, echoed verbatim in the response.
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Response status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The operation was accepted and applied.
    Success,
    /// The operation was rejected; see `message`.
    Error,
}

/// Outbound response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    /// Outcome tag.
    pub status: ResponseStatus,

    /// Human-readable outcome description.
    pub message: String,

    /// Echoed correlation id, absent when the request carried none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl CommandResponse {
    fn success(message: String, request_id: Option<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message,
            request_id,
        }
    }

    fn error(message: String, request_id: Option<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message,
            request_id,
        }
    }
}

/// Maps command envelopes onto supervisor operations.
pub struct Dispatcher {
    supervisor: Arc<Supervisor>,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared supervisor.
    #[must_use]
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        Self { supervisor }
    }

    /// Handles one request. Never panics or returns an error: every
    /// failure becomes a `status: error` response.
    pub fn dispatch(&self, request: &CommandRequest) -> CommandResponse {
        let request_id = request
            .metadata
            .as_ref()
            .and_then(|meta| meta.request_id.clone());
        info!(
            request_type = %request.request_type,
            operation = %request.operation,
            module = request.module.as_deref().unwrap_or("-"),
            request_id = request_id.as_deref().unwrap_or("-"),
            "dispatching command"
        );

        match self.route(request) {
            Ok(message) => CommandResponse::success(message, request_id),
            Err(message) => {
                warn!(%message, "command rejected");
                CommandResponse::error(message, request_id)
            }
        }
    }

    fn route(&self, request: &CommandRequest) -> Result<String, String> {
        match (request.request_type.as_str(), request.operation.as_str()) {
            ("command", "start") => {
                let name = target(request)?;
                self.supervisor.start_module(name).map_err(stringify)?;
                Ok(format!("module {name} started"))
            }
            ("command", "stop") => {
                let name = target(request)?;
                match self.supervisor.stop_module(name) {
                    Ok(()) => Ok(format!("module {name} stop requested")),
                    Err(SupervisorError::LifecycleViolation { state, .. }) => {
                        // Stop on an idle module is a no-op, not a failure.
                        warn!(module = %name, %state, "stop ignored, module not running");
                        Ok(format!("module {name} not running, stop ignored"))
                    }
                    Err(err) => Err(stringify(err)),
                }
            }
            ("configure", "modify") => {
                // Acknowledged without touching live configuration; the
                // payload is echoed so callers can confirm receipt.
                let payload = request.payload.clone().unwrap_or(Value::Null);
                info!(
                    module = request.module.as_deref().unwrap_or("-"),
                    %payload,
                    "configuration request acknowledged"
                );
                Ok(format!("configuration acknowledged: {payload}"))
            }
            ("command" | "configure", operation) => Err(format!("unknown operation: {operation}")),
            (request_type, _) => Err(format!("unknown request type: {request_type}")),
        }
    }
}

fn target(request: &CommandRequest) -> Result<&str, String> {
    request
        .module
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "missing target module name".to_string())
}

fn stringify(err: SupervisorError) -> String {
    // Error codes stay in the logs; clients get the message only.
    warn!(code = err.code(), "supervisor operation failed");
    err.to_string()
}
