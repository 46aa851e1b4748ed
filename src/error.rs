//! Error types for the relay pipeline.
//!
//! Internally every failure keeps its cause for logging. At the HTTP
//! boundary they collapse to six fixed messages so nothing about the
//! upstream or the relay's internals reaches the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::forward::ForwardError;
use crate::target::TargetError;

pub const MSG_INVALID_API_KEY: &str = "Invalid API key";
pub const MSG_URL_REQUIRED: &str = "URL required";
pub const MSG_INVALID_URL: &str = "Invalid URL format";
pub const MSG_DOMAIN_NOT_ALLOWED: &str = "Domain not allowed";
pub const MSG_PROXY_FAILED: &str = "Proxy request failed";
pub const MSG_BODY_TOO_LARGE: &str = "Request body too large";

/// Errors that terminate a relayed request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Missing or wrong `x-api-key`, or no secret configured.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    /// Inbound body longer than `limits.max_body_size`.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// `limits.request_timeout_secs` elapsed before the relay answered.
    #[error("request not completed within {0:?}")]
    DeadlineExceeded(std::time::Duration),

    /// Anything unexpected outside the upstream call.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            RelayError::Target(TargetError::Missing | TargetError::Malformed(_)) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Target(TargetError::HostNotAllowed(_)) => StatusCode::FORBIDDEN,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Forward(_) | RelayError::DeadlineExceeded(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::AuthenticationFailed => MSG_INVALID_API_KEY,
            RelayError::Target(TargetError::Missing) => MSG_URL_REQUIRED,
            RelayError::Target(TargetError::Malformed(_)) => MSG_INVALID_URL,
            RelayError::Target(TargetError::HostNotAllowed(_)) => MSG_DOMAIN_NOT_ALLOWED,
            RelayError::PayloadTooLarge { .. } => MSG_BODY_TOO_LARGE,
            RelayError::Forward(_) | RelayError::DeadlineExceeded(_) | RelayError::Internal(_) => {
                MSG_PROXY_FAILED
            }
        }
    }

    /// Label used in metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::AuthenticationFailed => "unauthorized",
            RelayError::Target(TargetError::Missing) => "missing_target",
            RelayError::Target(TargetError::Malformed(_)) => "malformed_target",
            RelayError::Target(TargetError::HostNotAllowed(_)) => "host_not_allowed",
            RelayError::Forward(_) => "forward_failed",
            RelayError::PayloadTooLarge { .. } => "payload_too_large",
            RelayError::DeadlineExceeded(_) => "timeout",
            RelayError::Internal(_) => "internal",
        }
    }
}

/// Body for a failed request: `{"error": message}`.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.public_message())
    }
}
