//! AES-256-CBC key unwrapping.
//!
//! The LCP basic profile stores the IV as the leading 16 bytes of every
//! encrypted field, followed by the PKCS#7-padded ciphertext.

use crate::error::{CryptoError, CryptoResult};
use crate::key::UserKey;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// Decrypts an `IV || ciphertext` blob with AES-256-CBC.
///
/// # Errors
///
/// [`CryptoError::CiphertextTooShort`] when the blob cannot hold an IV and
/// one block, [`CryptoError::Decryption`] when the padding check fails
/// (wrong key or corrupted data).
pub fn aes256_cbc_decrypt(key: &UserKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
    if data.len() < IV_SIZE * 2 {
        return Err(CryptoError::CiphertextTooShort(data.len()));
    }
    let (iv, ciphertext) = data.split_at(IV_SIZE);

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv).map_err(|_| {
        CryptoError::InvalidKeyLength {
            expected: super::KEY_SIZE,
            got: key.as_bytes().len(),
        }
    })?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decryption("bad padding (wrong key or corrupted data)".into()))
}

/// Encrypts a plaintext to an `IV || ciphertext` blob with AES-256-CBC.
///
/// The engine itself only decrypts; encryption exists for license tooling
/// and tests.
#[must_use]
pub fn aes256_cbc_encrypt(key: &UserKey, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes256CbcEnc::new(key.as_bytes().into(), iv.into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut blob = Vec::with_capacity(IV_SIZE + ciphertext.len());
    blob.extend_from_slice(iv);
    blob.extend_from_slice(&ciphertext);
    blob
}
