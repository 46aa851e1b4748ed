//! Network layer subsystem.
//!
//! Plain TCP listeners are bound directly in startup; this module only
//! holds the optional TLS termination setup.

pub mod tls;

pub use tls::{load_tls_config, TlsError};
