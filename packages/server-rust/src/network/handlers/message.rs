//! `POST /api/v1/llm/message`: run one message through the pipeline.
//!
//! Response contract:
//! - `Published`: 200 with the record JSON.
//! - `Rejected`, `ExtractionFailed`, or a body without `message`: 400 with
//!   `{"error":"Invalid message format"}`.
//! - Load shed: 503 with `{"error":"Server overloaded"}`.
//! - Arriving while the server drains: 503 with `{"error":"Server shutting down"}`.
//! - Body above the size limit: 413 with `{"error":"Payload too large"}`.
//!
//! Every response names its outcome in `x-pipeline-outcome`; extraction
//! failures also carry the failure kind in `x-extraction-error`, so callers
//! can tell a non-bank message from a failed extraction without parsing the
//! body.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use spendwire_core::{PipelineOutcome, RawMessage};
use tower::ServiceExt;
use tracing::debug;

use super::AppState;
use crate::pipeline::PipelineError;

pub const MESSAGE_ROUTE: &str = "/api/v1/llm/message";

pub const OUTCOME_HEADER: &str = "x-pipeline-outcome";
pub const EXTRACTION_ERROR_HEADER: &str = "x-extraction-error";

const INVALID_MESSAGE: &str = "Invalid message format";
const OVERLOADED: &str = "Server overloaded";
const SHUTTING_DOWN: &str = "Server shutting down";
const TOO_LARGE: &str = "Payload too large";

/// Request body. `message` is optional here so a missing field is answered
/// with the same 400 as any other unusable input.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn message_handler(
    State(state): State<AppState>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> Response {
    if state.shutdown.is_draining() {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "draining", SHUTTING_DOWN);
    }

    let text = match body {
        Ok(Json(MessageRequest {
            message: Some(text),
        })) => text,
        Ok(Json(MessageRequest { message: None })) => {
            debug!("request body has no message field");
            return invalid("missing_message");
        }
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            debug!(error = %rejection, "request body over the size limit");
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", TOO_LARGE);
        }
        Err(rejection) => {
            debug!(error = %rejection, "unreadable request body");
            return invalid("missing_message");
        }
    };

    let _guard = state.shutdown.in_flight_guard();
    match state.pipeline.oneshot(RawMessage::new(text)).await {
        Ok(outcome) => outcome_response(outcome),
        Err(PipelineError::Overloaded) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "overloaded", OVERLOADED)
        }
    }
}

fn outcome_response(outcome: PipelineOutcome) -> Response {
    let label = outcome.as_str();
    match outcome {
        PipelineOutcome::Published(record) => (
            StatusCode::OK,
            [(OUTCOME_HEADER, label)],
            Json(record.serialize()),
        )
            .into_response(),
        PipelineOutcome::Rejected => invalid(label),
        PipelineOutcome::ExtractionFailed(err) => (
            StatusCode::BAD_REQUEST,
            [(OUTCOME_HEADER, label), (EXTRACTION_ERROR_HEADER, err.kind())],
            Json(json!({ "error": INVALID_MESSAGE })),
        )
            .into_response(),
    }
}

fn invalid(outcome: &'static str) -> Response {
    error_response(StatusCode::BAD_REQUEST, outcome, INVALID_MESSAGE)
}

fn error_response(status: StatusCode, outcome: &'static str, message: &str) -> Response {
    (
        status,
        [(OUTCOME_HEADER, outcome)],
        Json(json!({ "error": message })),
    )
        .into_response()
}
