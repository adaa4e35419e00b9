//! HTTPS listener for the `ssl` profile.

use std::{io, net::SocketAddr, path::PathBuf};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsSettings;

/// Errors raised while preparing the TLS listener.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("certificate file not found: {}", .0.display())]
    MissingCertificate(PathBuf),
    #[error("private key file not found: {}", .0.display())]
    MissingPrivateKey(PathBuf),
    #[error("failed to load TLS material: {0}")]
    Load(#[from] io::Error),
}

/// Load the rustls configuration from the configured PEM files.
pub async fn load_tls_config(settings: &TlsSettings) -> Result<RustlsConfig, TlsError> {
    if !settings.certificate.exists() {
        return Err(TlsError::MissingCertificate(settings.certificate.clone()));
    }
    if !settings.private_key.exists() {
        return Err(TlsError::MissingPrivateKey(settings.private_key.clone()));
    }
    Ok(RustlsConfig::from_pem_file(&settings.certificate, &settings.private_key).await?)
}

/// Serve `app` over HTTPS until the server stops.
pub async fn serve_tls(app: Router, addr: SocketAddr, config: RustlsConfig) -> io::Result<()> {
    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
}
