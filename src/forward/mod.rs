//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! validated Url + method + translated headers + payload
//!     → client.rs (single reqwest call)
//!     → content.rs (JSON or text by content-type)
//!     → ResponseEnvelope { status, data }
//! ```

pub mod client;
pub mod content;

pub use client::{ForwardError, Forwarder};
pub use content::contains_json;
