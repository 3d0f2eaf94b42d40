// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Server certificate loading

use crate::error::{InjectorError, Result};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;
use tracing::info;

/// Build a TLS acceptor from a PEM certificate chain and private key
pub fn load_tls_acceptor(cert_file: &Path, key_file: &Path) -> Result<TlsAcceptor> {
    let certs = parse_certificates(&std::fs::read(cert_file)?)?;
    let key = parse_private_key(&std::fs::read(key_file)?)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| InjectorError::TlsError(format!("unsupported protocol versions: {e}")))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| InjectorError::TlsError(format!("invalid key pair: {e}")))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    info!("Loaded TLS key pair from {}", cert_file.display());

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn parse_certificates(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_slice_iter(pem)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| InjectorError::TlsError(format!("failed to parse certificates: {e}")))?;

    if certs.is_empty() {
        return Err(InjectorError::TlsError("no certificates found".to_string()));
    }

    Ok(certs)
}

fn parse_private_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>> {
    PrivateKeyDer::from_pem_slice(pem)
        .map_err(|e| InjectorError::TlsError(format!("failed to parse private key: {e}")))
}
