//! The relay pipeline.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → authenticate (x-api-key vs configured secret)     ✗ 401
//!     → validate target (query.url | body.url, whitelist) ✗ 400 / 403
//!     → translate headers (x-target-* → *)
//!     → forward (one upstream call, decode by type)       ✗ 500
//!     → ResponseEnvelope
//! ```
//!
//! # Design Decisions
//! - Strictly sequential; the first failing stage ends the request
//! - Configuration is passed in at construction, never read globally
//! - No outbound call happens unless authentication and validation passed

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::forward::{ForwardError, Forwarder};
use crate::http::headers::translate;
use crate::http::request::InboundRequest;
use crate::http::response::ResponseEnvelope;
use crate::security::{authenticate, provided_key};
use crate::target::TargetValidator;

/// Request-scoped pipeline over shared read-only configuration.
#[derive(Debug, Clone)]
pub struct Relay {
    config: Arc<RelayConfig>,
    validator: Arc<TargetValidator>,
    forwarder: Forwarder,
}

impl Relay {
    /// Build the pipeline. Fails only if the upstream client cannot be built.
    pub fn new(config: Arc<RelayConfig>) -> Result<Self, ForwardError> {
        let validator = Arc::new(TargetValidator::new(
            config.targets.allowed_hosts.iter().cloned(),
        ));
        let forwarder = Forwarder::new(&config.upstream, validator.clone())?;

        Ok(Self {
            config,
            validator,
            forwarder,
        })
    }

    /// Run one request through every stage.
    pub async fn handle(&self, request: InboundRequest) -> Result<ResponseEnvelope, RelayError> {
        if !authenticate(
            provided_key(&request.headers),
            self.config.auth.api_key.as_deref(),
        ) {
            return Err(RelayError::AuthenticationFailed);
        }

        let target = self.validator.validate(request.target_url())?;
        let headers = translate(&request.headers);
        let payload = request.payload().map(str::to_owned);

        tracing::debug!(
            method = %request.method,
            host = target.host_str().unwrap_or_default(),
            forwarded_headers = headers.len(),
            has_payload = payload.is_some(),
            "Forwarding request"
        );

        let envelope = self
            .forwarder
            .forward(target, request.method, headers, payload)
            .await?;

        Ok(envelope)
    }
}
