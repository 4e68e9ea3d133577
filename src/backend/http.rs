//! Shared HTTP plumbing for the backends.
//!
//! # Responsibilities
//! - Build the reqwest client with a default deadline
//! - Classify reqwest failures into `BackendError`
//! - Extract a human-readable message from JSON error bodies

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::backend::BackendError;

const USER_AGENT: &str = concat!("banter-uploader/", env!("CARGO_PKG_VERSION"));

/// Build a client whose requests time out after `timeout` unless overridden per request.
pub fn build_client(timeout: Duration) -> Result<Client, BackendError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| BackendError::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// Classify a reqwest error. The URL is stripped because it may carry an API key.
pub fn classify_error(context: &str, err: reqwest::Error) -> BackendError {
    let err = err.without_url();
    if err.is_builder() {
        BackendError::Configuration(format!("{}: {}", context, err))
    } else if err.is_decode() {
        BackendError::InvalidResponse(format!("{}: {}", context, err))
    } else if err.is_timeout() {
        BackendError::Transport(format!("{}: request timed out", context))
    } else if err.is_connect() {
        BackendError::Transport(format!("{}: cannot connect to server", context))
    } else {
        BackendError::Transport(format!("{}: {}", context, err))
    }
}

/// Pull an error message out of a JSON body.
///
/// Understands `{"error": {"message": "..."}}` and `{"error": "..."}`, plus a
/// top-level `message` or `detail` string.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let message = match value.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    message
        .or_else(|| value.get("message").and_then(Value::as_str).map(str::to_string))
        .or_else(|| value.get("detail").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}

/// Turn a non-success response into a rejection, reading its body best-effort.
pub async fn rejection(context: &str, response: Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    rejection_from_parts(context, status, &body)
}

pub(crate) fn rejection_from_parts(context: &str, status: StatusCode, body: &str) -> BackendError {
    let message = match extract_error_message(body) {
        Some(detail) => format!("{}: {}", context, detail),
        None => format!("{}: HTTP {}", context, status.as_u16()),
    };
    BackendError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// Reachability rule shared by all probes: anything below 500 is up.
pub fn is_reachable_status(status: StatusCode) -> bool {
    status.as_u16() < 500
}
