//! TLS connectors for IMAP probes.
//!
//! - verifying connector: system root certificates via `rustls-native-certs`
//! - non-verifying connector: accepts any server certificate, used only for
//!   the `imapcert` server type

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, ring};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::error::{AuthError, Result};

fn provider() -> Arc<CryptoProvider> {
    Arc::new(ring::default_provider())
}

/// Build a connector that validates against the system trust store.
///
/// Fails with [`AuthError::ProbeUnavailable`] when no root certificate can
/// be loaded, since every verifying login would then fail.
pub(crate) fn verifying_connector() -> Result<TlsConnector> {
    let rustls_native_certs::CertificateResult { certs, errors, .. } =
        rustls_native_certs::load_native_certs();
    for err in &errors {
        warn!("Error loading system root certificate: {}", err);
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    debug!(
        "Loaded {} system root certificate(s), ignored {}",
        added, ignored
    );
    if roots.is_empty() {
        return Err(AuthError::ProbeUnavailable(
            "no usable system root certificates for TLS verification".to_string(),
        ));
    }

    let config = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| AuthError::ProbeUnavailable(format!("TLS setup failed: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Build a connector that accepts any server certificate.
pub(crate) fn insecure_connector() -> Result<TlsConnector> {
    let provider = provider();
    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| AuthError::ProbeUnavailable(format!("TLS setup failed: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Certificate verifier that accepts all server certificates.
///
/// Handshake signatures are still checked so the session keys belong to the
/// presented certificate.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// TLS server name for an address (DNS name or IP literal).
pub(crate) fn server_name(address: &str) -> std::result::Result<ServerName<'static>, String> {
    ServerName::try_from(address.to_string()).map_err(|e| format!("invalid server name: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insecure_connector_builds() {
        assert!(insecure_connector().is_ok());
    }

    #[test]
    fn test_server_name_accepts_dns_and_ip() {
        assert!(server_name("mail.example.org").is_ok());
        assert!(server_name("127.0.0.1").is_ok());
        assert!(matches!(
            server_name("127.0.0.1").unwrap(),
            ServerName::IpAddress(_)
        ));
    }

    #[test]
    fn test_server_name_rejects_garbage() {
        assert!(server_name("not a host").is_err());
    }
}
