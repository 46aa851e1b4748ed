//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, InboundRequest extraction)
//!     → relay pipeline (headers.rs translates x-target-* headers)
//!     → response.rs (envelope) or error.rs (fixed error body)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use headers::{translate, FORWARD_PREFIX};
pub use request::{InboundRequest, RelayBody, UuidRequestId, X_REQUEST_ID};
pub use response::{EnvelopeData, ResponseEnvelope};
pub use server::HttpServer;
