//! Key recovery primitives for the LCP engine.
//!
//! The LCP basic profile derives the symmetric **user key** as the SHA-256
//! digest of the user passphrase, then uses it to unwrap the **content
//! key** with AES-256-CBC. This crate implements those primitives; the
//! decision of *which* passphrase is correct (the key check against the
//! license id) belongs to the engine crate.
//!
//! Raw passphrases never leave this crate: only the hex digest is exposed
//! for persistence, and key material is zeroized on drop.

mod cipher;
mod error;
mod key;
mod passphrase;

pub use cipher::{aes256_cbc_decrypt, aes256_cbc_encrypt, IV_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{ContentKey, UserKey, KEY_SIZE};
pub use passphrase::{hash_passphrase, PassphraseHash};
