//! Response envelope returned for every successful forward.
//!
//! # Design Decisions
//! - Upstream status is carried verbatim inside the envelope; the relay
//!   itself answers 200
//! - `data` is either the decoded JSON value or the raw text body
//! - Built once by the forwarder, never mutated afterwards

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Decoded upstream body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvelopeData {
    Json(Value),
    Text(String),
}

/// Uniform `{status, data}` structure handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    status: u16,
    data: EnvelopeData,
}

impl ResponseEnvelope {
    pub fn new(status: u16, data: EnvelopeData) -> Self {
        Self { status, data }
    }

    /// Upstream HTTP status.
    pub fn status(&self) -> u16 {
        self.status
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
