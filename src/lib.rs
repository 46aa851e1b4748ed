//! CORS relay library.
//!
//! A single-endpoint forwarding gateway: authenticate the caller, whitelist
//! the target URL, forward `x-target-*` headers, and wrap the upstream
//! response in a `{status, data}` envelope.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;
pub mod security;
pub mod target;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::Relay;
