//! The public license handle.
//!
//! One `License` wraps a validated License Document, the freshest Status
//! Document seen so far, the recovered user key and the persisted rights
//! counters. All mutating operations run under the access coordinator's
//! per-license guard.

use crate::coordinator::AccessCoordinator;
use crate::error::{LcpError, LcpResult, StatusError};
use crate::passphrases::recover_content_key;
use crate::protocol::DeviceLinkClient;
use crate::validation::LicenseValidator;
use bookvault_crypto::{ContentKey, UserKey};
use bookvault_license::{LicenseDocument, Status, StatusDocument, StatusRel};
use bookvault_store::RightsStore;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// What a consume operation spends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeKind {
    /// Printed pages.
    Print,
    /// Copied characters.
    Copy,
}

/// A point-in-time view of the remaining rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RightsSnapshot {
    /// Characters still allowed to copy; `None` is unlimited.
    pub copies_left: Option<i64>,
    /// Pages still allowed to print; `None` is unlimited.
    pub prints_left: Option<i64>,
    pub can_copy: bool,
    pub can_print: bool,
}

/// An opened, validated license.
pub struct License {
    document: RwLock<LicenseDocument>,
    status: RwLock<Option<StatusDocument>>,
    user_key: UserKey,
    rights: RightsStore,
    client: Arc<DeviceLinkClient>,
    validator: Arc<LicenseValidator>,
    coordinator: AccessCoordinator,
}

impl License {
    pub(crate) fn new(
        document: LicenseDocument,
        status: Option<StatusDocument>,
        user_key: UserKey,
        rights: RightsStore,
        client: Arc<DeviceLinkClient>,
        validator: Arc<LicenseValidator>,
        coordinator: AccessCoordinator,
    ) -> Self {
        Self {
            document: RwLock::new(document),
            status: RwLock::new(status),
            user_key,
            rights,
            client,
            validator,
            coordinator,
        }
    }

    /// The validated License Document, including any reissue adopted by a
    /// successful renewal.
    #[must_use]
    pub fn document(&self) -> LicenseDocument {
        self.document.read().unwrap().clone()
    }

    /// The freshest Status Document seen so far, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusDocument> {
        self.status.read().unwrap().clone()
    }

    /// Hands the content key to the resource-decryption path.
    ///
    /// Fails with the precise business-state error when the license is no
    /// longer usable, so a revoked loan is never decrypted.
    pub fn content_key(&self) -> LcpResult<ContentKey> {
        self.check_status()?;
        recover_content_key(&self.document.read().unwrap(), &self.user_key)
    }

    /// Checks the business state of the license.
    ///
    /// The source of truth is the most recently fetched Status Document;
    /// the local `rights.start`/`rights.end` check only covers licenses in
    /// a usable (or unknown) server state and is superseded by any fresh
    /// fetch.
    pub fn check_status(&self) -> LcpResult<()> {
        let document = self.document.read().unwrap();
        let status = self.status.read().unwrap();
        if let Some(status) = status.as_ref() {
            if let Some(error) = status_error(status, &document) {
                return Err(error.into());
            }
        }

        let now = Utc::now();
        if let Some(start) = document.rights.start {
            if now < start {
                return Err(StatusError::NotStarted(start).into());
            }
        }
        if let Some(end) = document.rights.end {
            if now > end {
                return Err(StatusError::Expired(end).into());
            }
        }
        Ok(())
    }

    // ── Rights consumption ──────────────────────────────────────

    /// A snapshot of the remaining quotas.
    pub fn rights(&self) -> LcpResult<RightsSnapshot> {
        let document = self.document.read().unwrap();
        let record = self.rights.get(&document.id)?;
        let (copies_left, prints_left) = match record {
            Some(record) => (record.copies_left, record.prints_left),
            None => (document.rights.copy, document.rights.print),
        };
        Ok(RightsSnapshot {
            copies_left,
            prints_left,
            can_copy: copies_left.map(|left| left > 0).unwrap_or(true),
            can_print: prints_left.map(|left| left > 0).unwrap_or(true),
        })
    }

    /// True when `amount` characters can still be copied.
    pub fn can_copy(&self, amount: i64) -> LcpResult<bool> {
        Ok(self
            .rights()?
            .copies_left
            .map(|left| amount <= left)
            .unwrap_or(true))
    }

    /// True when `amount` pages can still be printed.
    pub fn can_print(&self, amount: i64) -> LcpResult<bool> {
        Ok(self
            .rights()?
            .prints_left
            .map(|left| amount <= left)
            .unwrap_or(true))
    }

    /// Consumes quota. Returns `Ok(false)`, leaving the counters
    /// untouched, when the remaining quota is insufficient.
    ///
    /// # Errors
    ///
    /// [`LcpError::LicenseIsBusy`] when another operation is in flight for
    /// this license.
    pub fn consume(&self, kind: ConsumeKind, amount: i64) -> LcpResult<bool> {
        let license_id = self.document.read().unwrap().id.clone();
        let _guard = self.coordinator.try_acquire(&license_id)?;
        let consumed = match kind {
            ConsumeKind::Copy => self.rights.decrement_copies(&license_id, amount)?,
            ConsumeKind::Print => self.rights.decrement_prints(&license_id, amount)?,
        };
        Ok(consumed)
    }

    /// Consumes copy quota. See [`Self::consume`].
    pub fn copy(&self, characters: i64) -> LcpResult<bool> {
        self.consume(ConsumeKind::Copy, characters)
    }

    /// Consumes print quota. See [`Self::consume`].
    pub fn print(&self, pages: i64) -> LcpResult<bool> {
        self.consume(ConsumeKind::Print, pages)
    }

    // ── Protocol operations ─────────────────────────────────────

    /// True when the current Status Document exposes a `renew` link.
    #[must_use]
    pub fn can_renew(&self) -> bool {
        self.status
            .read()
            .unwrap()
            .as_ref()
            .map(|status| status.link(StatusRel::Renew).is_some())
            .unwrap_or(false)
    }

    /// The maximum date a renewal can extend the loan to, when the server
    /// advertised one.
    #[must_use]
    pub fn max_renew_date(&self) -> Option<DateTime<Utc>> {
        self.status
            .read()
            .unwrap()
            .as_ref()
            .and_then(|status| status.potential_rights.end)
    }

    /// True when the current Status Document exposes a `return` link.
    #[must_use]
    pub fn can_return(&self) -> bool {
        self.status
            .read()
            .unwrap()
            .as_ref()
            .map(|status| status.link(StatusRel::Return).is_some())
            .unwrap_or(false)
    }

    /// Registers this device with the license server and records the
    /// registration locally. Idempotent.
    pub async fn register(&self) -> LcpResult<()> {
        let document = self.document();
        let _guard = self.coordinator.try_acquire(&document.id)?;
        let Some(status) = self.status() else {
            return Err(LcpError::LicenseInteractionNotAvailable);
        };

        if let Some(fresh) = self.client.register(&document, &status).await? {
            self.adopt_status(fresh);
        }
        self.rights.mark_registered(&document.id)?;
        Ok(())
    }

    /// Extends the loan, optionally to a preferred end date.
    ///
    /// The server reissues the License Document on renewal; when the fresh
    /// Status Document advertises one, it is fetched and re-validated
    /// before anything held is replaced. A failed renewal leaves the held
    /// documents and the rights record untouched.
    pub async fn renew(&self, end: Option<DateTime<Utc>>) -> LcpResult<()> {
        let document = self.document();
        let _guard = self.coordinator.try_acquire(&document.id)?;
        let status = self.usable_status()?;

        let fresh = self.client.renew(&document, &status, end).await?;
        self.adopt(document, fresh).await
    }

    /// Returns the publication early.
    ///
    /// A failed return leaves the held documents and the rights record
    /// untouched.
    pub async fn return_license(&self) -> LcpResult<()> {
        let document = self.document();
        let _guard = self.coordinator.try_acquire(&document.id)?;
        let status = self.usable_status()?;

        let fresh = self.client.return_license(&document, &status).await?;
        self.adopt_status(fresh);
        Ok(())
    }

    /// Refreshes the Status Document from the server, picking up any
    /// License Document reissue it advertises.
    pub async fn fetch_status(&self) -> LcpResult<()> {
        let document = self.document();
        let fresh = self.client.fetch_status(&document).await?;
        self.adopt(document, fresh).await
    }

    /// The current status, rejecting absorbing states up front: once a
    /// license is revoked, returned or cancelled, no interaction succeeds
    /// regardless of link presence.
    fn usable_status(&self) -> LcpResult<StatusDocument> {
        let Some(status) = self.status() else {
            return Err(LcpError::LicenseInteractionNotAvailable);
        };
        if status.status.is_terminal() {
            if let Some(error) = status_error(&status, &self.document.read().unwrap()) {
                return Err(error.into());
            }
        }
        Ok(status)
    }

    /// Adopts a fetched Status Document and, when it advertises a License
    /// Document newer than the held one, the reissued license as well. The
    /// reissue is fetched and fully re-validated before either document is
    /// replaced, so a failure changes nothing.
    async fn adopt(&self, document: LicenseDocument, fresh: StatusDocument) -> LcpResult<()> {
        if fresh.updated.license > document.updated_or_issued() {
            let reissued = self.client.fetch_license(&document, &fresh).await?;
            self.validator.validate(&reissued).await?;
            self.adopt_status(fresh);
            *self.document.write().unwrap() = reissued;
        } else {
            self.adopt_status(fresh);
        }
        Ok(())
    }

    /// Replaces the held Status Document when the fetched one is fresher;
    /// an older fetch is discarded.
    fn adopt_status(&self, fresh: StatusDocument) {
        let mut held = self.status.write().unwrap();
        match held.as_ref() {
            Some(current) if !fresh.supersedes(current) => {
                tracing::debug!(license_id = %self.document.read().unwrap().id,
                    "discarding status fetch older than the held document");
            }
            _ => *held = Some(fresh),
        }
    }
}

/// Maps a server-asserted state to its user-facing error, if any.
fn status_error(status: &StatusDocument, license: &LicenseDocument) -> Option<StatusError> {
    let date = status.updated.status;
    match status.status {
        Status::Ready | Status::Active => None,
        Status::Revoked => Some(StatusError::Revoked {
            date,
            devices: status.registered_devices(),
        }),
        Status::Returned => Some(StatusError::Returned(date)),
        Status::Cancelled => Some(StatusError::Cancelled(date)),
        Status::Expired => Some(StatusError::Expired(
            license.rights.end.unwrap_or(date),
        )),
    }
}
