//! Target subsystem.
//!
//! # Data Flow
//! ```text
//! query.url / body.url
//!     → resolve.rs (query wins over body)
//!     → validator.rs (absolute URL, host in whitelist)
//!     → Return: parsed Url or TargetError
//! ```
//!
//! # Design Decisions
//! - Whitelist is built once at startup, immutable at runtime
//! - Exact host membership only: no wildcards, no subdomain matching
//! - An empty whitelist rejects every target

pub mod resolve;
pub mod validator;

pub use resolve::resolve_field;
pub use validator::{TargetError, TargetValidator};
