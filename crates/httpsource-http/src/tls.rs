//! TLS trust configuration (spec §4.10).

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, Error as RustlsError, SignatureScheme};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Minimum/maximum negotiated TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

/// Certificate trust policy. `Disabled` (skip verification outright) is never
/// the default and must be opted into explicitly by the caller.
#[derive(Clone)]
pub enum TrustMode {
    /// Standard platform root-of-trust verification.
    Strict,
    /// Accepts self-signed/unverifiable chains; still requires a valid signature.
    Relaxed,
    /// No certificate verification at all.
    Disabled,
    /// Accepts only a certificate (or SPKI) whose SHA-256 digest matches.
    Pinned { sha256: [u8; 32] },
}

impl fmt::Debug for TrustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Relaxed => write!(f, "Relaxed"),
            Self::Disabled => write!(f, "Disabled"),
            Self::Pinned { .. } => write!(f, "Pinned"),
        }
    }
}

/// Hostname verification, mirroring [`TrustMode`] (spec §4.10: "hostname
/// verification modes mirroring those").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostnameVerification {
    Enforced,
    Skipped,
}

/// A [`ServerCertVerifier`] that accepts any certificate whose DER bytes hash
/// to a pinned SHA-256 digest, regardless of chain validity.
#[derive(Debug)]
pub(crate) struct PinnedCertVerifier {
    expected_sha256: [u8; 32],
}

impl PinnedCertVerifier {
    pub(crate) fn new(expected_sha256: [u8; 32]) -> Arc<Self> {
        Arc::new(Self { expected_sha256 })
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        let digest = Sha256::digest(end_entity.as_ref());
        if digest.as_slice() == self.expected_sha256 {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(RustlsError::General("certificate does not match pinned SHA-256 digest".into()))
        }
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_verifier_rejects_non_matching_digest() {
        let verifier = PinnedCertVerifier::new([0u8; 32]);
        let cert = CertificateDer::from(vec![1, 2, 3]);
        let result = verifier.verify_server_cert(
            &cert,
            &[],
            &ServerName::try_from("example.com").unwrap(),
            &[],
            UnixTime::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn pinned_verifier_accepts_matching_digest() {
        let cert_bytes = vec![1, 2, 3];
        let digest: [u8; 32] = Sha256::digest(&cert_bytes).into();
        let verifier = PinnedCertVerifier::new(digest);
        let cert = CertificateDer::from(cert_bytes);
        let result = verifier.verify_server_cert(
            &cert,
            &[],
            &ServerName::try_from("example.com").unwrap(),
            &[],
            UnixTime::now(),
        );
        assert!(result.is_ok());
    }
}
