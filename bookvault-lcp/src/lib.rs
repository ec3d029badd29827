//! License lifecycle and rights enforcement for LCP-protected
//! publications.
//!
//! This crate is the engine behind the Bookvault reading applications. It
//! parses and cryptographically validates License Documents, recovers the
//! content-decryption key from a user passphrase, tracks consumable
//! print/copy quotas against the persistent store, and drives the network
//! protocol for device registration, loan renewal and loan return.
//!
//! # Guarantees
//!
//! - **At most one mutation in flight per license**: a second mutating
//!   call fails fast with [`LcpError::LicenseIsBusy`] instead of queuing.
//! - **Typed errors everywhere**: every failure is a variant the UI can
//!   map to a precise, localized message; only [`LcpError::Network`] is
//!   retryable.
//! - **No partial state**: a failed renew or return leaves the held
//!   Status Document and the rights counters untouched.
//! - **Passphrases never persist in the clear**: only SHA-256 digests are
//!   stored or compared.
//!
//! # Entry point
//!
//! Build an [`LcpService`] with an [`LcpConfig`], a
//! [`bookvault_store::Store`] and the UI's [`LcpAuthenticating`]
//! implementation, then open licenses with
//! [`LcpService::retrieve_license`].

mod certificate;
mod config;
mod coordinator;
mod crl;
mod device;
mod error;
mod license;
mod network;
mod passphrases;
mod protocol;
mod service;
mod validation;

pub use certificate::ProviderCertificate;
pub use config::{LcpConfig, DEFAULT_CRL_URL};
pub use coordinator::{AccessCoordinator, LicenseGuard};
pub use crl::CrlService;
pub use device::DeviceService;
pub use error::{
    IntegrityError, LcpError, LcpResult, RenewError, ReturnError, StatusError,
};
pub use license::{ConsumeKind, License, RightsSnapshot};
pub use network::{HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use passphrases::{
    check_user_key, recover_content_key, AuthenticationReason, LcpAuthenticating,
    PassphrasesService,
};
pub use protocol::DeviceLinkClient;
pub use service::LcpService;
pub use validation::{LicenseValidator, SUPPORTED_PROFILES};
