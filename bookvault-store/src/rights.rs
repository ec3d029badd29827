//! Persisted per-license rights counters.

use crate::error::StoreResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// The persisted rights state of one license.
///
/// `None` counters are unlimited. Once non-null, a counter only decreases
/// and never goes negative. `registered` transitions `false → true` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RightsRecord {
    pub license_id: String,
    pub copies_left: Option<i64>,
    pub prints_left: Option<i64>,
    pub registered: bool,
}

/// Store for the `rights` table.
#[derive(Clone)]
pub struct RightsStore {
    conn: Arc<Mutex<Connection>>,
}

impl RightsStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Returns the record for the given license, if one exists.
    pub fn get(&self, license_id: &str) -> StoreResult<Option<RightsRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT license_id, copies_left, prints_left, registered
                 FROM rights WHERE license_id = ?1",
                params![license_id],
                |row| {
                    Ok(RightsRecord {
                        license_id: row.get(0)?,
                        copies_left: row.get(1)?,
                        prints_left: row.get(2)?,
                        registered: row.get::<_, i64>(3)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Seeds a record with the license's initial quotas if none exists.
    /// No-op when a record is already present, so replaying a license open
    /// never resets consumed counters.
    pub fn upsert_baseline(
        &self,
        license_id: &str,
        copies: Option<i64>,
        prints: Option<i64>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO rights (license_id, copies_left, prints_left, registered)
             VALUES (?1, ?2, ?3, 0)",
            params![license_id, copies, prints],
        )?;
        if inserted > 0 {
            tracing::debug!(license_id, ?copies, ?prints, "seeded rights baseline");
        }
        Ok(())
    }

    /// Marks the device as registered for this license. Idempotent; the
    /// flag never goes back to false.
    pub fn mark_registered(&self, license_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE rights SET registered = 1 WHERE license_id = ?1",
            params![license_id],
        )?;
        Ok(())
    }

    /// Consumes `amount` copy units. Returns `false` and leaves the record
    /// untouched when the remaining quota is insufficient; always succeeds
    /// without mutation when the quota is NULL (unlimited).
    pub fn decrement_copies(&self, license_id: &str, amount: i64) -> StoreResult<bool> {
        self.decrement(license_id, "copies_left", amount)
    }

    /// Consumes `amount` print units, with the same semantics as
    /// [`Self::decrement_copies`].
    pub fn decrement_prints(&self, license_id: &str, amount: i64) -> StoreResult<bool> {
        self.decrement(license_id, "prints_left", amount)
    }

    fn decrement(&self, license_id: &str, column: &str, amount: i64) -> StoreResult<bool> {
        if amount < 0 {
            return Ok(false);
        }
        let conn = self.conn.lock().unwrap();

        // Unlimited quota: consume nothing, report success.
        let quota: Option<Option<i64>> = conn
            .query_row(
                &format!("SELECT {column} FROM rights WHERE license_id = ?1"),
                params![license_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(quota) = quota else {
            // No record at all: nothing to consume against.
            return Ok(false);
        };
        if quota.is_none() {
            return Ok(true);
        }

        // Single guarded UPDATE: the storage-level atomic read-modify-write
        // holds even when a second process bypasses the coordinator.
        let updated = conn.execute(
            &format!(
                "UPDATE rights SET {column} = {column} - ?1
                 WHERE license_id = ?2 AND {column} >= ?1"
            ),
            params![amount, license_id],
        )?;
        Ok(updated > 0)
    }
}
