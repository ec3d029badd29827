//! Passphrase hashing.
//!
//! The SHA-256 hex digest is the only form of a passphrase that is ever
//! persisted or compared; the raw text is dropped as soon as the digest is
//! computed.

use sha2::{Digest, Sha256};

/// The SHA-256 hex digest of a user passphrase.
///
/// This is both the persisted form and the raw user-key material: hex
/// decoding the digest yields the 32-byte AES key of the LCP basic profile.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PassphraseHash(String);

impl PassphraseHash {
    /// Wraps an already-computed digest, normalizing to lowercase.
    ///
    /// Stored digests may be uppercase; comparisons are done on the
    /// normalized form.
    #[must_use]
    pub fn from_hex(digest: &str) -> Self {
        Self(digest.to_lowercase())
    }

    /// The lowercase hex digest.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PassphraseHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The digest is not the passphrase, but it is key material.
        f.write_str("PassphraseHash([REDACTED])")
    }
}

/// Hashes a raw passphrase to its SHA-256 hex digest.
#[must_use]
pub fn hash_passphrase(passphrase: &str) -> PassphraseHash {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.as_bytes());
    PassphraseHash(hex::encode(hasher.finalize()))
}
