//! Provider certificates.
//!
//! A provider certificate is formatted as
//! `base64url(payload).base64url(signature)`: the payload is a JSON object
//! carrying the serial, subject, Ed25519 public key and validity window,
//! and the signature is the root CA's Ed25519 signature over the
//! base64url-encoded payload string.

use crate::error::IntegrityError;
use base64::{engine::general_purpose::STANDARD, engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde_json::Value;

/// A parsed provider certificate, as embedded in a license's
/// `signature.certificate`.
#[derive(Debug, Clone)]
pub struct ProviderCertificate {
    /// Serial number, the unit of revocation.
    pub serial: String,
    /// The certified provider.
    pub subject: String,
    /// Start of the validity window.
    pub not_before: DateTime<Utc>,
    /// End of the validity window.
    pub not_after: DateTime<Utc>,
    verifying_key: VerifyingKey,
    payload_b64: String,
    signature: Signature,
}

impl ProviderCertificate {
    /// Parses a certificate from the raw bytes found in the license.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::CertificateSignatureInvalid`] for any structural
    /// problem: the validator treats an unparseable certificate the same
    /// as one failing the chain check.
    pub fn parse(data: &[u8]) -> Result<Self, IntegrityError> {
        let text = std::str::from_utf8(data)
            .map_err(|_| IntegrityError::CertificateSignatureInvalid)?
            .trim();

        let (payload_b64, signature_b64) = text
            .split_once('.')
            .ok_or(IntegrityError::CertificateSignatureInvalid)?;

        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| IntegrityError::CertificateSignatureInvalid)?;
        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|_| IntegrityError::CertificateSignatureInvalid)?;

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| IntegrityError::CertificateSignatureInvalid)?;
        let payload: Value = serde_json::from_slice(&payload_json)
            .map_err(|_| IntegrityError::CertificateSignatureInvalid)?;

        let field = |name: &str| -> Result<&str, IntegrityError> {
            payload
                .get(name)
                .and_then(Value::as_str)
                .ok_or(IntegrityError::CertificateSignatureInvalid)
        };

        let key_bytes: [u8; 32] = STANDARD
            .decode(field("public_key")?)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(IntegrityError::CertificateSignatureInvalid)?;
        let verifying_key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|_| IntegrityError::CertificateSignatureInvalid)?;

        let date = |name: &str| -> Result<DateTime<Utc>, IntegrityError> {
            DateTime::parse_from_rfc3339(field(name)?)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| IntegrityError::CertificateSignatureInvalid)
        };

        Ok(Self {
            serial: field("serial")?.to_string(),
            subject: field("subject")?.to_string(),
            not_before: date("not_before")?,
            not_after: date("not_after")?,
            verifying_key,
            payload_b64: payload_b64.to_string(),
            signature,
        })
    }

    /// Verifies that the certificate was signed by the trusted root.
    ///
    /// The root signature covers the base64url-encoded payload string, not
    /// the decoded JSON.
    pub fn verify_chain(&self, root: &VerifyingKey) -> Result<(), IntegrityError> {
        root.verify(self.payload_b64.as_bytes(), &self.signature)
            .map_err(|_| IntegrityError::CertificateSignatureInvalid)
    }

    /// True when the given instant falls inside the validity window.
    #[must_use]
    pub fn contains_date(&self, date: DateTime<Utc>) -> bool {
        self.not_before <= date && date <= self.not_after
    }

    /// Verifies a license signature with the certificate's public key.
    pub fn verify_license_signature(
        &self,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), IntegrityError> {
        let signature = Signature::from_slice(signature)
            .map_err(|_| IntegrityError::LicenseSignatureInvalid)?;
        self.verifying_key
            .verify(message, &signature)
            .map_err(|_| IntegrityError::LicenseSignatureInvalid)
    }
}
