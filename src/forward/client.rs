//! Outbound HTTP client.
//!
//! # Responsibilities
//! - Issue exactly one upstream call per relayed request
//! - Decode the upstream body by content type into a ResponseEnvelope
//! - Classify failures for logging; callers see a single error kind
//!
//! # Design Decisions
//! - One shared reqwest::Client (connection pooling across requests)
//! - No retries; timeouts only when configured
//! - The response body is drained exactly once, by `json()` or `text()`
//! - Redirect hops are held to the same host whitelist as the first request;
//!   a hop to any other host is not followed and its 3xx is relayed as-is

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header::CONTENT_TYPE, HeaderMap, Method};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::forward::content::contains_json;
use crate::http::response::{EnvelopeData, ResponseEnvelope};
use crate::observability::metrics;
use crate::target::TargetValidator;

const MAX_REDIRECTS: usize = 10;

/// Upstream failure, classified for logs.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("upstream request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream redirect failed: {0}")]
    Redirect(#[source] reqwest::Error),

    #[error("failed to read upstream body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to decode upstream body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl ForwardError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Client(_) => "client",
            ForwardError::Connect(_) => "connect",
            ForwardError::Timeout(_) => "timeout",
            ForwardError::Redirect(_) => "redirect",
            ForwardError::Body(_) => "body",
            ForwardError::Decode(_) => "decode",
            ForwardError::Request(_) => "request",
        }
    }
}

impl From<reqwest::Error> for ForwardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ForwardError::Timeout(err)
        } else if err.is_connect() {
            ForwardError::Connect(err)
        } else if err.is_redirect() {
            ForwardError::Redirect(err)
        } else if err.is_decode() {
            ForwardError::Decode(err)
        } else if err.is_body() {
            ForwardError::Body(err)
        } else {
            ForwardError::Request(err)
        }
    }
}

/// Issues upstream calls on behalf of the relay.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Build the shared client from configuration. `validator` vets every
    /// redirect hop.
    pub fn new(config: &UpstreamConfig, validator: Arc<TargetValidator>) -> Result<Self, ForwardError> {
        let mut builder = reqwest::Client::builder();

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        builder = builder.redirect(if config.follow_redirects {
            whitelisted_redirects(validator)
        } else {
            reqwest::redirect::Policy::none()
        });

        if !config.system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(ForwardError::Client)?;
        Ok(Self { client })
    }

    /// Send one request upstream and normalize the response.
    pub async fn forward(
        &self,
        target: Url,
        method: Method,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<ResponseEnvelope, ForwardError> {
        let start = Instant::now();
        let result = self.exchange(target, method, headers, body).await;

        match &result {
            Ok(envelope) => {
                tracing::debug!(
                    status = envelope.status(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                metrics::record_upstream("ok", start);
            }
            Err(e) => metrics::record_upstream(e.kind(), start),
        }

        result
    }

    async fn exchange(
        &self,
        target: Url,
        method: Method,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<ResponseEnvelope, ForwardError> {
        let mut request = self.client.request(method, target).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        let data = if contains_json(content_type) {
            EnvelopeData::Json(response.json::<Value>().await?)
        } else {
            EnvelopeData::Text(response.text().await?)
        };

        Ok(ResponseEnvelope::new(status, data))
    }
}

fn whitelisted_redirects(validator: Arc<TargetValidator>) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if validator.allows(attempt.url()) {
            attempt.follow()
        } else {
            tracing::warn!(
                host = attempt.url().host_str().unwrap_or_default(),
                "Redirect to a host outside the whitelist not followed"
            );
            attempt.stop()
        }
    })
}
