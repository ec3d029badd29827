//! User and content key types, zeroized on drop.

use crate::error::{CryptoError, CryptoResult};
use crate::passphrase::PassphraseHash;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the symmetric keys in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// The symmetric user key, derived from a passphrase.
///
/// Under the LCP basic profile the key bytes are the SHA-256 digest of the
/// passphrase.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct UserKey {
    bytes: [u8; KEY_SIZE],
}

impl UserKey {
    /// Derives the user key from a raw passphrase.
    #[must_use]
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        Self { bytes: digest.into() }
    }

    /// Rebuilds the user key from a persisted passphrase digest.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidHash`] if the digest is not 64 hex characters.
    pub fn from_hash(hash: &PassphraseHash) -> CryptoResult<Self> {
        let decoded = hex::decode(hash.as_hex())
            .map_err(|e| CryptoError::InvalidHash(e.to_string()))?;
        let bytes: [u8; KEY_SIZE] = decoded
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                got: v.len(),
            })?;
        Ok(Self { bytes })
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKey").field("bytes", &"[REDACTED]").finish()
    }
}

/// The content-decryption key, unwrapped from the license with the user
/// key. Handed to the resource-decryption path, never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ContentKey {
    bytes: Vec<u8>,
}

impl ContentKey {
    /// Wraps unwrapped key bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKey").field("bytes", &"[REDACTED]").finish()
    }
}
