//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file, then API_KEY / ALLOWED_DOMAINS env)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the relay pipeline
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_with_env, ConfigError};
pub use schema::{
    AuthConfig, CorsConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, RelayConfig,
    TargetsConfig, TlsConfig, UpstreamConfig,
};
