//! SQLite persistence for the LCP engine.
//!
//! Two tables back the engine:
//!
//! - `rights`: per-license consumable counters (copies/prints left) and the
//!   device-registration flag. The decrement operations run as single
//!   guarded `UPDATE` statements, so the counters stay consistent even if a
//!   second process bypasses the in-process coordinator.
//! - `passphrases`: append-only SHA-256 passphrase digests, keyed by
//!   license id and optionally scoped to a provider/user. Raw passphrases
//!   are never stored.
//!
//! The store is an explicitly constructed handle, injected where needed;
//! there is no global connection.

mod error;
mod passphrases;
mod rights;

pub use error::{StoreError, StoreResult};
pub use passphrases::{PassphraseRecord, PassphraseStore};
pub use rights::{RightsRecord, RightsStore};

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A handle on the engine database, shared by the per-table stores.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (or creates) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Open(format!("{}: {e}", path.display())))?;
        Self::init(conn)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Open(format!("in-memory: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS rights (
                license_id TEXT PRIMARY KEY,
                copies_left INTEGER,
                prints_left INTEGER,
                registered INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS passphrases (
                license_id TEXT NOT NULL,
                provider TEXT,
                user_id TEXT,
                passphrase_hash TEXT NOT NULL,
                UNIQUE(license_id, passphrase_hash)
            );
            ",
        )?;
        tracing::debug!("license store schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Returns the rights store backed by this database.
    #[must_use]
    pub fn rights(&self) -> RightsStore {
        RightsStore::new(Arc::clone(&self.conn))
    }

    /// Returns the passphrase store backed by this database.
    #[must_use]
    pub fn passphrases(&self) -> PassphraseStore {
        PassphraseStore::new(Arc::clone(&self.conn))
    }
}
