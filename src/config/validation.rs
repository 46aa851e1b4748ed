//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, host entries and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - A missing API key is not an error: the relay starts and rejects everything

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("targets.allowed_hosts[{index}]: '{value}' is not a bare hostname")]
    InvalidHost { index: usize, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::Empty { field: "listener.tls.cert_path" });
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::Empty { field: "listener.tls.key_path" });
        }
    }

    for (index, host) in config.targets.allowed_hosts.iter().enumerate() {
        if !is_bare_hostname(host) {
            errors.push(ValidationError::InvalidHost {
                index,
                value: host.clone(),
            });
        }
    }

    if config.upstream.timeout_secs == Some(0) {
        errors.push(ValidationError::Zero { field: "upstream.timeout_secs" });
    }
    if config.upstream.connect_timeout_secs == Some(0) {
        errors.push(ValidationError::Zero { field: "upstream.connect_timeout_secs" });
    }
    if config.limits.request_timeout_secs == Some(0) {
        errors.push(ValidationError::Zero { field: "limits.request_timeout_secs" });
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_body_size" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// Ports and paths would never equal a parsed URL's hostname.
fn is_bare_hostname(host: &str) -> bool {
    !host.is_empty()
        && !host
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == ':')
}
