//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (preflight answers, response headers)
//!     → auth.rs (x-api-key against the configured secret)
//!     → Pass to target validation
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod auth;
pub mod cors;

pub use auth::{authenticate, provided_key, API_KEY_HEADER};
pub use cors::cors_layer;
