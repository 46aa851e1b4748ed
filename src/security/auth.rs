//! Shared-secret authentication.
//!
//! # Design Decisions
//! - Fail closed: no configured secret (or an empty one) means no caller
//!   is accepted
//! - Exact, case-sensitive comparison with no normalization
//! - Comparison time does not depend on where the first mismatch is

use axum::http::HeaderMap;

/// Header carrying the caller's secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Returns true only if a non-empty secret is configured and `provided`
/// equals it exactly. An empty configured secret counts as unset.
pub fn authenticate(provided: Option<&str>, configured: Option<&str>) -> bool {
    match (provided, configured) {
        (Some(provided), Some(configured)) if !configured.is_empty() => {
            constant_time_eq(provided.as_bytes(), configured.as_bytes())
        }
        _ => false,
    }
}

/// Extract the caller's secret from the inbound headers.
///
/// A value that is not visible ASCII is treated as absent.
pub fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
