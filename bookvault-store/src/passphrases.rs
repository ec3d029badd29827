//! Append-only storage of passphrase digests.

use crate::error::StoreResult;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// A persisted passphrase digest, associated with the license it unlocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassphraseRecord {
    pub license_id: String,
    pub provider: Option<String>,
    pub user_id: Option<String>,
    /// SHA-256 hex digest. Never the raw passphrase.
    pub passphrase_hash: String,
}

/// Store for the `passphrases` table.
#[derive(Clone)]
pub struct PassphraseStore {
    conn: Arc<Mutex<Connection>>,
}

impl PassphraseStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Records a digest that successfully unlocked a license. Duplicate
    /// `(license_id, hash)` pairs are ignored.
    pub fn add(&self, record: &PassphraseRecord) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO passphrases (license_id, provider, user_id, passphrase_hash)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.license_id,
                record.provider,
                record.user_id,
                record.passphrase_hash
            ],
        )?;
        Ok(())
    }

    /// Digests previously recorded for this exact license.
    pub fn hashes_for_license(&self, license_id: &str) -> StoreResult<Vec<String>> {
        self.query(
            "SELECT passphrase_hash FROM passphrases WHERE license_id = ?1",
            params![license_id],
        )
    }

    /// Digests recorded for the same provider (and user, when known). A
    /// passphrase often unlocks every license a provider issued to a user.
    pub fn hashes_for_provider(
        &self,
        provider: &str,
        user_id: Option<&str>,
    ) -> StoreResult<Vec<String>> {
        match user_id {
            Some(user_id) => self.query(
                "SELECT DISTINCT passphrase_hash FROM passphrases
                 WHERE provider = ?1 AND user_id = ?2",
                params![provider, user_id],
            ),
            None => self.query(
                "SELECT DISTINCT passphrase_hash FROM passphrases WHERE provider = ?1",
                params![provider],
            ),
        }
    }

    /// Every digest ever recorded, for the last-resort candidate sweep.
    pub fn all_hashes(&self) -> StoreResult<Vec<String>> {
        self.query("SELECT DISTINCT passphrase_hash FROM passphrases", params![])
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}
