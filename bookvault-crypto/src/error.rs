//! Error types for the crypto primitives.

use thiserror::Error;

/// Crypto-specific errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material has the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    /// The ciphertext is too short to carry an IV.
    #[error("ciphertext too short: {0} bytes")]
    CiphertextTooShort(usize),

    /// Decryption failed (wrong key or corrupted data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A stored passphrase hash is not a valid SHA-256 hex digest.
    #[error("invalid passphrase hash: {0}")]
    InvalidHash(String),
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
