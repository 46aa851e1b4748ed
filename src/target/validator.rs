//! Target URL validation against the host whitelist.

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

/// Why a caller-supplied target was refused.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("no target URL supplied")]
    Missing,

    #[error("target URL is malformed: {0}")]
    Malformed(#[from] url::ParseError),

    #[error("host '{0}' is not in the allowed list")]
    HostNotAllowed(String),
}

/// Parses caller-supplied URLs and checks them against an exact host set.
#[derive(Debug, Clone, Default)]
pub struct TargetValidator {
    allowed_hosts: HashSet<String>,
}

impl TargetValidator {
    /// Create a validator. An empty host list rejects every URL.
    pub fn new<I, S>(allowed_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_hosts: allowed_hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate `raw`, returning the parsed URL unchanged on success.
    pub fn validate(&self, raw: Option<&str>) -> Result<Url, TargetError> {
        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(TargetError::Missing),
        };

        let url = Url::parse(raw)?;
        if !self.allows(&url) {
            let host = url.host_str().unwrap_or_default();
            return Err(TargetError::HostNotAllowed(host.to_string()));
        }

        Ok(url)
    }

    /// Whether `url`'s host is whitelisted. Also applied to redirect hops.
    pub fn allows(&self, url: &Url) -> bool {
        // URLs without an authority (mailto:, data:) have no hostname and
        // can never be whitelisted.
        url.host_str()
            .is_some_and(|host| self.allowed_hosts.contains(host))
    }
}
