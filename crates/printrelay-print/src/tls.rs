// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TLS acceptor construction from PEM certificate and key text.
//
// Uses the ring crypto provider explicitly so the process-wide default
// provider never has to be installed.

use std::sync::Arc;

use rustls::ServerConfig;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;
use tracing::debug;

use printrelay_core::error::{PrintRelayError, Result};
use printrelay_core::types::HttpsSettings;

/// Build an acceptor from `https` (which must have `use_https` set).
pub fn acceptor(https: &HttpsSettings) -> Result<TlsAcceptor> {
    let config = server_config(&https.https_cert, &https.https_cert_key)?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Parse the PEM chain and key into a rustls server configuration.
pub fn server_config(cert_pem: &str, key_pem: &str) -> Result<ServerConfig> {
    let chain = CertificateDer::pem_slice_iter(cert_pem.as_bytes())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PrintRelayError::Tls(format!("certificate parsing failed: {e}")))?;
    if chain.is_empty() {
        return Err(PrintRelayError::Tls("no certificate found in PEM".into()));
    }
    let key = PrivateKeyDer::from_pem_slice(key_pem.as_bytes())
        .map_err(|e| PrintRelayError::Tls(format!("private key parsing failed: {e}")))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| PrintRelayError::Tls(format!("protocol selection failed: {e}")))?
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .map_err(|e| PrintRelayError::Tls(format!("certificate rejected: {e}")))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    debug!("TLS server configuration built");
    Ok(config)
}
