//! The engine error taxonomy.
//!
//! Every failure is a typed value so the reading application can render a
//! precise, localized message. The families mirror the lifecycle:
//! parsing, integrity, business status, renew/return protocol outcomes,
//! transport, and concurrency. Only `Network` is eligible for
//! caller-driven retry.

use bookvault_license::ParsingError;
use bookvault_store::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Business-state errors reported from the Status Document.
///
/// These are fatal: the app should explain the state to the user and stop.
/// The wording must match the actual state (never "expired" for a revoked
/// license) and carry the date of the transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("this license was cancelled on {0}")]
    Cancelled(DateTime<Utc>),

    #[error("this license has been returned on {0}")]
    Returned(DateTime<Utc>),

    #[error("this license starts on {0}")]
    NotStarted(DateTime<Utc>),

    #[error("this license expired on {0}")]
    Expired(DateTime<Utc>),

    /// `devices` is the number of `register` events in the Status
    /// Document, shown to the user only when non-zero.
    #[error("this license was revoked by its provider on {date}")]
    Revoked { date: DateTime<Utc>, devices: usize },
}

/// Failures while checking the integrity of a license. Fatal, never
/// retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("certificate has been revoked in the CRL")]
    CertificateRevoked,

    #[error("certificate has not been signed by the CA")]
    CertificateSignatureInvalid,

    #[error("license signature does not match")]
    LicenseSignatureInvalid,

    #[error("license has been issued by an expired certificate")]
    LicenseSignatureDateInvalid,

    #[error("user key check invalid")]
    UserKeyCheckInvalid,
}

/// Outcomes of a loan renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewError {
    #[error("publication could not be renewed properly")]
    RenewFailed,

    #[error("incorrect renewal period, publication could not be renewed")]
    InvalidRenewalPeriod { max_renew_date: Option<DateTime<Utc>> },

    #[error("an unexpected error has occurred on the licensing server")]
    UnexpectedServerError,
}

/// Outcomes of an early return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReturnError {
    #[error("publication could not be returned properly")]
    ReturnFailed,

    #[error("publication has already been returned or is expired")]
    AlreadyReturnedOrExpired,

    #[error("an unexpected error has occurred on the licensing server")]
    UnexpectedServerError,
}

/// The top-level engine error.
#[derive(Debug, Error)]
pub enum LcpError {
    /// No cached passphrase unlocked the license and the prompt was
    /// declined.
    #[error("passphrase is not available")]
    MissingPassphrase,

    /// The current Status Document exposes no link for this interaction.
    #[error("this interaction is not available with this license")]
    LicenseInteractionNotAvailable,

    /// The license declares an encryption profile this engine cannot
    /// handle.
    #[error("unsupported license encryption profile: {0}")]
    LicenseProfileNotSupported(String),

    /// The Certificate Revocation List could not be retrieved and no
    /// cached copy exists, so revocation is unknown.
    #[error("can't retrieve the certificate revocation list")]
    CrlFetching,

    /// A mutating operation is already in flight for this license id.
    /// Callers should not retry immediately; the UI is expected to disable
    /// the action instead.
    #[error("another operation is in progress for license {0}")]
    LicenseIsBusy(String),

    /// A transport-level failure (timeout, DNS, TLS). The only retryable
    /// family.
    #[error("network error: {0}")]
    Network(String),

    /// The content key could not be decrypted from the user key.
    #[error("unable to decrypt the content key from the user key")]
    ContentKeyDecrypt,

    /// Publication content could not be decrypted with the content key.
    #[error("unable to decrypt content from the content key")]
    ContentDecrypt,

    #[error(transparent)]
    Parsing(#[from] ParsingError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error("renew failed: {0}")]
    Renew(#[from] RenewError),

    #[error("return failed: {0}")]
    Return(#[from] ReturnError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// An unexpected internal error. Logged for diagnostics.
    #[error("unexpected LCP error: {0}")]
    Runtime(String),

    /// An unrecognized low-level failure. Anything outside the documented
    /// set maps here rather than growing new semantics.
    #[error("unknown LCP error: {0}")]
    Unknown(String),
}

impl LcpError {
    /// True only for transport failures; every other family must not be
    /// retried automatically.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type for engine operations.
pub type LcpResult<T> = Result<T, LcpError>;
