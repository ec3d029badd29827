//! License integrity validation.
//!
//! The checks run in a fixed order and short-circuit on the first failure:
//! certificate chain, revocation, license signature, then issue date. No
//! network or disk writes happen here beyond the CRL service's own cache.

use crate::certificate::ProviderCertificate;
use crate::crl::CrlService;
use crate::error::{IntegrityError, LcpError, LcpResult};
use bookvault_license::LicenseDocument;
use ed25519_dalek::VerifyingKey;
use std::sync::Arc;

/// Encryption profiles this engine can handle.
pub const SUPPORTED_PROFILES: &[&str] = &[
    "http://readium.org/lcp/basic-profile",
    "http://readium.org/lcp/profile-1.0",
];

/// Verifies the authenticity of a License Document.
pub struct LicenseValidator {
    crl: Arc<CrlService>,
    root: VerifyingKey,
}

impl LicenseValidator {
    /// Creates a validator trusting the given root CA public key.
    pub fn new(crl: Arc<CrlService>, root_key: &[u8; 32]) -> LcpResult<Self> {
        let root = VerifyingKey::from_bytes(root_key)
            .map_err(|e| LcpError::Runtime(format!("invalid root CA key: {e}")))?;
        Ok(Self { crl, root })
    }

    /// Validates the license, short-circuiting on the first failure.
    ///
    /// # Errors
    ///
    /// In check order: [`LcpError::LicenseProfileNotSupported`],
    /// [`IntegrityError::CertificateSignatureInvalid`],
    /// [`IntegrityError::CertificateRevoked`] (or [`LcpError::CrlFetching`]
    /// when revocation is unknown),
    /// [`IntegrityError::LicenseSignatureInvalid`], and
    /// [`IntegrityError::LicenseSignatureDateInvalid`].
    pub async fn validate(&self, license: &LicenseDocument) -> LcpResult<()> {
        let profile = license.encryption.profile.as_str();
        if !SUPPORTED_PROFILES.contains(&profile) {
            return Err(LcpError::LicenseProfileNotSupported(profile.to_string()));
        }

        let certificate = ProviderCertificate::parse(&license.signature.certificate)?;
        certificate.verify_chain(&self.root)?;

        if self.crl.is_revoked(&certificate.serial).await? {
            return Err(IntegrityError::CertificateRevoked.into());
        }

        certificate
            .verify_license_signature(&license.canonical_bytes(), &license.signature.value)?;

        if !certificate.contains_date(license.issued) {
            return Err(IntegrityError::LicenseSignatureDateInvalid.into());
        }

        tracing::debug!(license_id = %license.id, "license integrity verified");
        Ok(())
    }
}
