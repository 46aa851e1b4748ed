//! Outbound header derivation.
//!
//! # Responsibilities
//! - Select inbound headers carrying the forwarding prefix
//! - Strip the prefix and keep the value untouched
//!
//! # Design Decisions
//! - Allowlist by prefix: nothing without the prefix reaches the upstream,
//!   including the caller's `x-api-key`
//! - Pure function producing a new map; the inbound map is never mutated
//! - Duplicate stripped names: last write wins

use axum::http::{HeaderMap, HeaderName};

/// Prefix marking an inbound header for forwarding.
pub const FORWARD_PREFIX: &str = "x-target-";

/// Derive the outbound header set from the inbound headers.
pub fn translate(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for (name, value) in inbound {
        let Some(stripped) = name.as_str().strip_prefix(FORWARD_PREFIX) else {
            continue;
        };

        match HeaderName::from_bytes(stripped.as_bytes()) {
            Ok(target_name) => {
                outbound.insert(target_name, value.clone());
            }
            Err(_) => {
                tracing::debug!(header = %name, "Skipping forwarding header with empty name");
            }
        }
    }

    outbound
}
