//! Inbound request extraction.
//!
//! # Responsibilities
//! - Tag every request with an `x-request-id` (UUID v4) as early as possible
//! - Turn an axum request into the read-only InboundRequest the pipeline sees
//! - Resolve target URL and payload from query string or JSON body
//!
//! # Design Decisions
//! - Query parameters take precedence over body fields
//! - A body that is not a JSON object carries no fields
//! - Non-string body fields are forwarded as their JSON text
//! - Bodies over the configured limit are refused before any field is read

use std::collections::HashMap;
use std::error::Error as _;

use axum::{
    body::Body,
    http::{header::CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue, Method, Request},
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::RelayError;
use crate::target::resolve_field;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Query parameter / body field naming the target URL.
pub const URL_FIELD: &str = "url";
/// Query parameter / body field carrying the outbound payload.
pub const BODY_FIELD: &str = "body";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Fields the caller may put in a JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayBody {
    pub url: Option<String>,
    pub body: Option<String>,
}

impl RelayBody {
    /// Parse a raw inbound body. Anything but a JSON object yields no fields.
    pub fn parse(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(fields)) => Self {
                url: fields.get(URL_FIELD).and_then(field_text),
                body: fields.get(BODY_FIELD).and_then(field_text),
            },
            Ok(_) => Self::default(),
            Err(e) => {
                tracing::debug!(error = %e, "Inbound body is not JSON, ignoring it");
                Self::default()
            }
        }
    }
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A parsed inbound request, read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    pub body: RelayBody,
}

impl InboundRequest {
    /// Assemble from already-separated parts.
    pub fn from_parts(method: Method, headers: HeaderMap, raw_query: Option<&str>, body: &[u8]) -> Self {
        let query = raw_query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        Self {
            method,
            headers,
            query,
            body: RelayBody::parse(body),
        }
    }

    /// Buffer an axum request, refusing bodies longer than `limit` bytes.
    ///
    /// A declared `content-length` over the limit is refused without reading;
    /// chunked bodies are cut off as soon as they cross it.
    pub async fn read(request: Request<Body>, limit: usize) -> Result<Self, RelayError> {
        let (parts, body) = request.into_parts();

        let declared = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if declared.is_some_and(|len| len > limit as u64) {
            return Err(RelayError::PayloadTooLarge { limit });
        }

        let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
            if is_length_limit(&e) {
                RelayError::PayloadTooLarge { limit }
            } else {
                RelayError::Internal(format!("failed to read inbound body: {e}"))
            }
        })?;

        Ok(Self::from_parts(
            parts.method,
            parts.headers,
            parts.uri.query(),
            &bytes,
        ))
    }

    /// Target URL, query first.
    pub fn target_url(&self) -> Option<&str> {
        resolve_field(
            self.query.get(URL_FIELD).map(String::as_str),
            self.body.url.as_deref(),
        )
    }

    /// Outbound payload, query first.
    pub fn payload(&self) -> Option<&str> {
        resolve_field(
            self.query.get(BODY_FIELD).map(String::as_str),
            self.body.body.as_deref(),
        )
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}
