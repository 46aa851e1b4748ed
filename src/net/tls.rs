//! TLS termination material for the listener.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsConfig;

/// Why the listener's certificate or key could not be loaded.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{what} file not found: {}", .path.display())]
    MissingFile { what: &'static str, path: PathBuf },

    #[error("invalid TLS material: {0}")]
    Load(#[source] std::io::Error),
}

/// Build the rustls server config from the PEM files named in `tls`.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    let cert = existing_file("certificate", &tls.cert_path)?;
    let key = existing_file("private key", &tls.key_path)?;

    tracing::debug!(cert = %cert.display(), key = %key.display(), "Loading TLS material");
    RustlsConfig::from_pem_file(cert, key)
        .await
        .map_err(TlsError::Load)
}

fn existing_file<'a>(what: &'static str, path: &'a str) -> Result<&'a Path, TlsError> {
    let path = Path::new(path);
    if path.is_file() {
        Ok(path)
    } else {
        Err(TlsError::MissingFile {
            what,
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tls(cert_path: &Path, key_path: &Path) -> TlsConfig {
        TlsConfig {
            cert_path: cert_path.display().to_string(),
            key_path: key_path.display().to_string(),
        }
    }

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cors-relay-tls-{}.pem", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn missing_certificate_is_reported_first() {
        let config = tls(Path::new("/no/such/cert.pem"), Path::new("/no/such/key.pem"));
        let Err(err) = load_tls_config(&config).await else {
            panic!("missing certificate should fail");
        };
        assert!(matches!(err, TlsError::MissingFile { what: "certificate", .. }));
        assert!(err.to_string().contains("/no/such/cert.pem"));
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let cert = temp_file("not really a certificate");
        let config = tls(&cert, Path::new("/no/such/key.pem"));

        let Err(err) = load_tls_config(&config).await else {
            panic!("missing key should fail");
        };
        assert!(matches!(err, TlsError::MissingFile { what: "private key", .. }));

        std::fs::remove_file(cert).unwrap();
    }

    #[tokio::test]
    async fn unparseable_pem_is_a_load_error() {
        let cert = temp_file("garbage");
        let key = temp_file("garbage");

        let Err(err) = load_tls_config(&tls(&cert, &key)).await else {
            panic!("garbage PEM should fail");
        };
        assert!(matches!(err, TlsError::Load(_)));

        std::fs::remove_file(cert).unwrap();
        std::fs::remove_file(key).unwrap();
    }
}
