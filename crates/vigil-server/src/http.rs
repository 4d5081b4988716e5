//! HTTP transport adapter for the command dispatcher.
//!
//! One endpoint: `/api` accepts the command envelope over POST, PUT,
//! and PATCH with a JSON content type, plus a trivial GET probe.
//! Malformed or non-JSON bodies yield 400 with a plain-text reason;
//! unrouted methods yield 405. A panic anywhere below the handler is
//! converted to a generic 500 JSON body — the supervisor itself never
//! sees a protocol-level crash.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tracing::{error, warn};
use vigil_runtime::{CommandRequest, Dispatcher};

/// Builds the command API router.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route(
            "/api",
            get(probe)
                .post(dispatch)
                .put(dispatch)
                .patch(dispatch),
        )
        .layer(tower_http::catch_panic::CatchPanicLayer::custom(
            panic_response,
        ))
        .with_state(dispatcher)
}

async fn probe() -> &'static str {
    "vigil command endpoint"
}

async fn dispatch(
    State(dispatcher): State<Arc<Dispatcher>>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            warn!(reason = %rejection, "rejecting non-JSON command");
            return (StatusCode::BAD_REQUEST, rejection.to_string()).into_response();
        }
    };

    // Dispatch off the async workers: lane creation and lifecycle
    // bookkeeping may briefly block.
    let outcome = tokio::task::spawn_blocking(move || dispatcher.dispatch(&request)).await;
    match outcome {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            error!(error = %err, "dispatch task failed");
            internal_error()
        }
    }
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("panic caught at the transport boundary");
    internal_error()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error", "message": "internal error" })),
    )
        .into_response()
}
