//! Passphrase resolution and content-key recovery.
//!
//! The engine first tries every previously-successful passphrase digest it
//! knows about (for this license, then for the same provider/user, then
//! any), so a publication unlocks silently whenever possible. Only when no
//! candidate passes the key check is the authenticating collaborator asked
//! to prompt the user.

use crate::error::{IntegrityError, LcpError, LcpResult};
use async_trait::async_trait;
use bookvault_crypto::{
    aes256_cbc_decrypt, hash_passphrase, ContentKey, PassphraseHash, UserKey,
};
use bookvault_license::LicenseDocument;
use bookvault_store::{PassphraseRecord, PassphraseStore};
use std::sync::Arc;

/// Why the user is being prompted for a passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationReason {
    /// No stored passphrase unlocks this license.
    PassphraseNotFound,
    /// The passphrase the user just entered failed the key check.
    InvalidPassphrase,
}

/// The UI-owned collaborator that prompts for a passphrase.
///
/// Invoked only after every cached digest failed the key check. Returning
/// `None` means the user declined.
#[async_trait]
pub trait LcpAuthenticating: Send + Sync {
    async fn request_passphrase(
        &self,
        license: &LicenseDocument,
        reason: AuthenticationReason,
    ) -> Option<String>;
}

/// Resolves the user key for a license, silently when possible.
pub struct PassphrasesService {
    store: PassphraseStore,
    authentication: Arc<dyn LcpAuthenticating>,
}

impl PassphrasesService {
    pub fn new(store: PassphraseStore, authentication: Arc<dyn LcpAuthenticating>) -> Self {
        Self {
            store,
            authentication,
        }
    }

    /// Finds a user key passing the license's key check.
    ///
    /// Tries stored digests first (most specific scope first; first success
    /// wins), then prompts through the authenticating collaborator when
    /// `allow_user_interaction` is set, re-validating every answer.
    ///
    /// # Errors
    ///
    /// [`LcpError::MissingPassphrase`] when no candidate passed and the
    /// prompt was declined or interaction is not allowed.
    pub async fn resolve(
        &self,
        license: &LicenseDocument,
        allow_user_interaction: bool,
    ) -> LcpResult<UserKey> {
        for hash in self.candidate_hashes(license)? {
            if let Ok(key) = UserKey::from_hash(&hash) {
                if check_user_key(license, &key) {
                    tracing::debug!(license_id = %license.id, "license unlocked from stored passphrase");
                    self.persist(license, &hash)?;
                    return Ok(key);
                }
            }
        }

        if !allow_user_interaction {
            return Err(LcpError::MissingPassphrase);
        }

        let mut reason = AuthenticationReason::PassphraseNotFound;
        loop {
            let Some(passphrase) = self
                .authentication
                .request_passphrase(license, reason)
                .await
            else {
                return Err(LcpError::MissingPassphrase);
            };

            let hash = hash_passphrase(&passphrase);
            let key = UserKey::from_passphrase(&passphrase);
            if check_user_key(license, &key) {
                self.persist(license, &hash)?;
                return Ok(key);
            }
            reason = AuthenticationReason::InvalidPassphrase;
        }
    }

    /// Stored digests to try, most specific scope first, deduplicated.
    fn candidate_hashes(&self, license: &LicenseDocument) -> LcpResult<Vec<PassphraseHash>> {
        let mut seen = std::collections::HashSet::new();
        let mut candidates = Vec::new();
        let mut push_all = |hashes: Vec<String>| {
            for hash in hashes {
                let hash = PassphraseHash::from_hex(&hash);
                if seen.insert(hash.as_hex().to_string()) {
                    candidates.push(hash);
                }
            }
        };

        push_all(self.store.hashes_for_license(&license.id)?);
        let user_id = license.user.as_ref().and_then(|user| user.id.as_deref());
        push_all(self.store.hashes_for_provider(&license.provider, user_id)?);
        push_all(self.store.all_hashes()?);
        Ok(candidates)
    }

    fn persist(&self, license: &LicenseDocument, hash: &PassphraseHash) -> LcpResult<()> {
        self.store.add(&PassphraseRecord {
            license_id: license.id.clone(),
            provider: Some(license.provider.clone()),
            user_id: license
                .user
                .as_ref()
                .and_then(|user| user.id.clone()),
            passphrase_hash: hash.as_hex().to_string(),
        })?;
        Ok(())
    }
}

/// Runs the key check: the user key must decrypt `user_key.key_check` back
/// to the exact license id.
#[must_use]
pub fn check_user_key(license: &LicenseDocument, key: &UserKey) -> bool {
    match aes256_cbc_decrypt(key, &license.encryption.user_key.key_check) {
        Ok(plaintext) => plaintext == license.id.as_bytes(),
        Err(_) => false,
    }
}

/// Unwraps the content key with a user key that already passed the check.
///
/// # Errors
///
/// [`IntegrityError::UserKeyCheckInvalid`] when the key fails the check
/// after all, [`LcpError::ContentKeyDecrypt`] when the content key cannot
/// be unwrapped.
pub fn recover_content_key(license: &LicenseDocument, key: &UserKey) -> LcpResult<ContentKey> {
    if !check_user_key(license, key) {
        return Err(IntegrityError::UserKeyCheckInvalid.into());
    }
    let bytes = aes256_cbc_decrypt(key, &license.encryption.content_key.encrypted_value)
        .map_err(|_| LcpError::ContentKeyDecrypt)?;
    Ok(ContentKey::new(bytes))
}
