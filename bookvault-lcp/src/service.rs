//! The engine entry point.

use crate::config::LcpConfig;
use crate::coordinator::AccessCoordinator;
use crate::crl::CrlService;
use crate::device::DeviceService;
use crate::error::LcpResult;
use crate::license::License;
use crate::network::{HttpTransport, ReqwestTransport};
use crate::passphrases::{LcpAuthenticating, PassphrasesService};
use crate::protocol::DeviceLinkClient;
use crate::validation::LicenseValidator;
use bookvault_license::{LicenseDocument, StatusRel};
use bookvault_store::Store;
use std::sync::Arc;

/// The License Lifecycle & Rights Enforcement engine.
///
/// Owns the validator, the CRL cache, the passphrase resolution, the
/// protocol client and the access coordinator, and hands out [`License`]
/// handles to the reading application.
pub struct LcpService {
    validator: Arc<LicenseValidator>,
    passphrases: PassphrasesService,
    client: Arc<DeviceLinkClient>,
    store: Store,
    coordinator: AccessCoordinator,
}

impl LcpService {
    /// Builds the engine with the production HTTP transport.
    pub fn new(
        config: LcpConfig,
        store: Store,
        authentication: Arc<dyn LcpAuthenticating>,
        device: DeviceService,
    ) -> LcpResult<Self> {
        let http: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(config.http_timeout)?);
        Self::with_transport(config, store, authentication, device, http)
    }

    /// Builds the engine over an explicit transport (used by tests to talk
    /// to a local server).
    pub fn with_transport(
        config: LcpConfig,
        store: Store,
        authentication: Arc<dyn LcpAuthenticating>,
        device: DeviceService,
        http: Arc<dyn HttpTransport>,
    ) -> LcpResult<Self> {
        let crl = Arc::new(CrlService::new(
            Arc::clone(&http),
            config.crl_url.clone(),
            config.crl_max_age,
        ));
        let validator = Arc::new(LicenseValidator::new(crl, &config.root_certificate)?);
        let passphrases = PassphrasesService::new(store.passphrases(), authentication);
        let client = Arc::new(DeviceLinkClient::new(http, device));

        Ok(Self {
            validator,
            passphrases,
            client,
            store,
            coordinator: AccessCoordinator::new(),
        })
    }

    /// Opens a license from its raw bytes.
    ///
    /// Parses and validates the document, fetches the Status Document
    /// (best effort: a network failure falls back to the license alone so
    /// offline reading keeps working), resolves the user key, seeds the
    /// rights baseline and registers the device when the server expects
    /// it.
    ///
    /// # Errors
    ///
    /// Parsing, integrity and passphrase failures abort the open; status
    /// fetch and registration failures do not.
    pub async fn retrieve_license(
        &self,
        license_bytes: &[u8],
        allow_user_interaction: bool,
    ) -> LcpResult<License> {
        let document = LicenseDocument::parse(license_bytes)?;
        self.validator.validate(&document).await?;

        let mut status = match self.client.fetch_status(&document).await {
            Ok(status) => Some(status),
            Err(error) => {
                tracing::warn!(license_id = %document.id, %error,
                    "status fetch failed, proceeding with the license alone");
                None
            }
        };

        let user_key = self
            .passphrases
            .resolve(&document, allow_user_interaction)
            .await?;

        let rights = self.store.rights();
        rights.upsert_baseline(&document.id, document.rights.copy, document.rights.print)?;

        // Register the device while opening, when the server expects it.
        // Failures are logged and never abort the open.
        if let Some(current) = status.as_ref() {
            let registered = rights
                .get(&document.id)?
                .map(|record| record.registered)
                .unwrap_or(false);
            if !registered && current.link(StatusRel::Register).is_some() {
                match self.client.register(&document, current).await {
                    Ok(fresh) => {
                        rights.mark_registered(&document.id)?;
                        if let Some(fresh) = fresh {
                            if status
                                .as_ref()
                                .map(|held| fresh.supersedes(held))
                                .unwrap_or(true)
                            {
                                status = Some(fresh);
                            }
                        }
                    }
                    Err(error) => {
                        tracing::warn!(license_id = %document.id, %error,
                            "device registration failed");
                    }
                }
            }
        }

        Ok(License::new(
            document,
            status,
            user_key,
            rights,
            Arc::clone(&self.client),
            Arc::clone(&self.validator),
            self.coordinator.clone(),
        ))
    }
}
