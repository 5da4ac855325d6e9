//! TLS — rustls ClientConfig building for the streaming handshake.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{ring, verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::warn;

use super::model::LogsConfig;
use crate::error::{LogError, Result};

/// Accepts any server certificate. Handshake signatures are still checked so
/// the peer must hold the key for the certificate it presents.
#[derive(Debug)]
struct TrustEverything {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for TrustEverything {
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
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

impl LogsConfig {
    /// Build a rustls ClientConfig from the configuration: webpki roots by
    /// default, no certificate validation when `trust_self_signed_certs` is set.
    pub fn build_client_tls(&self) -> Result<Arc<ClientConfig>> {
        let provider = Arc::new(ring::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| LogError::Config(format!("TLS setup failed: {}", e)))?;

        let config = if self.trust_self_signed_certs {
            warn!("Certificate validation is DISABLED for log streaming; use only with self-signed deployments");
            let verifier = TrustEverything {
                algorithms: provider.signature_verification_algorithms,
            };
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(verifier))
                .with_no_client_auth()
        } else {
            let roots = RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            builder.with_root_certificates(roots).with_no_client_auth()
        };

        Ok(Arc::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tls_config_builds() {
        let cfg = LogsConfig::default();
        let tls = cfg.build_client_tls().expect("default TLS config should build");
        assert!(tls.alpn_protocols.is_empty());
    }

    #[test]
    fn test_permissive_tls_config_builds() {
        let cfg = LogsConfig {
            trust_self_signed_certs: true,
            ..Default::default()
        };
        assert!(cfg.build_client_tls().is_ok());
    }

    #[test]
    fn test_trust_everything_accepts_any_certificate() {
        let verifier = TrustEverything {
            algorithms: ring::default_provider().signature_verification_algorithms,
        };
        let cert = CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x01]);
        let name = ServerName::try_from("doppler.example.com").unwrap();

        assert!(verifier
            .verify_server_cert(&cert, &[], &name, &[], UnixTime::now())
            .is_ok());
        assert!(!verifier.supported_verify_schemes().is_empty());
    }
}
