//! Builds the `rustls::ClientConfig` the hyper-rustls connector uses, from
//! [`crate::Config`]'s trust bundle, client identity PEM, and
//! `accept_invalid_certs` override, using rustls 0.23's `pki_types`-based
//! API.
use std::sync::Arc;

use hyper_rustls::ConfigBuilderExt;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use thiserror::Error;

/// Errors constructing a TLS client configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    /// The PEM blob had no parseable certificate or private key in it.
    #[error("identity PEM is invalid: {0}")]
    InvalidIdentityPem(#[source] std::io::Error),
    /// The identity PEM had certificates but no private key.
    #[error("identity PEM is missing a private key (must be PKCS8, SEC1, or PKCS1)")]
    MissingPrivateKey,
    /// The identity PEM had a private key but no certificate.
    #[error("identity PEM is missing a certificate")]
    MissingCertificate,
    /// The client certificate/key pair was rejected by rustls.
    #[error("invalid client certificate/key pair: {0}")]
    InvalidClientAuth(#[source] rustls::Error),
    /// A root certificate failed to parse into the trust store.
    #[error("failed to add a root certificate: {0}")]
    AddRootCertificate(#[source] rustls::Error),
    /// Loading the platform's native root certificates failed.
    #[error("failed to load native root certificates: {0}")]
    NativeRoots(#[source] std::io::Error),
}

/// Build a `rustls::ClientConfig` from DER-encoded trust roots (falling back
/// to the platform's native roots when none are given), an optional
/// PEM-encoded client identity for mutual TLS, and whether to disable
/// server certificate verification entirely.
pub fn client_config(
    identity_pem: Option<&[u8]>,
    root_certs: Option<&[Vec<u8>]>,
    accept_invalid: bool,
) -> Result<ClientConfig, TlsError> {
    let builder = match root_certs {
        Some(certs) => ClientConfig::builder().with_root_certificates(root_store(certs)?),
        None => ClientConfig::builder().with_native_roots().map_err(TlsError::NativeRoots)?,
    };

    let mut config = match identity_pem.map(client_identity).transpose()? {
        Some((chain, key)) => builder.with_client_auth_cert(chain, key).map_err(TlsError::InvalidClientAuth)?,
        None => builder.with_no_client_auth(),
    };

    if accept_invalid {
        config.dangerous().set_certificate_verifier(Arc::new(NoVerification));
    }

    Ok(config)
}

fn root_store(root_certs: &[Vec<u8>]) -> Result<RootCertStore, TlsError> {
    let mut store = RootCertStore::empty();
    for der in root_certs {
        store
            .add(CertificateDer::from(der.clone()))
            .map_err(TlsError::AddRootCertificate)?;
    }
    Ok(store)
}

fn client_identity(pem: &[u8]) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TlsError> {
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut std::io::Cursor::new(pem))
        .collect::<Result<_, _>>()
        .map_err(TlsError::InvalidIdentityPem)?;
    if certs.is_empty() {
        return Err(TlsError::MissingCertificate);
    }
    let key = rustls_pemfile::private_key(&mut std::io::Cursor::new(pem))
        .map_err(TlsError::InvalidIdentityPem)?
        .ok_or(TlsError::MissingPrivateKey)?;
    Ok((certs, key))
}

/// Disables server certificate verification for `accept_invalid_certs`.
/// Dangerous outside local development; never the default.
#[derive(Debug)]
struct NoVerification;

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
