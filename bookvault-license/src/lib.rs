//! License and Status Document models for the LCP DRM scheme.
//!
//! This crate holds the immutable, parsed representations of the two JSON
//! documents the engine works with:
//!
//! - The **License Document** (`.lcpl`), signed by the content provider,
//!   asserting usage rights and carrying the encrypted content key.
//! - The **Status Document**, issued by the license server, reporting the
//!   current lifecycle state of a loan (ready, active, revoked, ...).
//!
//! Parsing is pure: no I/O, no side effects. A document with a missing
//! required field is rejected at construction and never partially built.

mod error;
mod license;
mod link;
mod status;

pub use error::{ParsingError, ParsingResult};
pub use license::{
    ContentKey, Encryption, LicenseDocument, LicenseRel, Rights, Signature, User, UserKey,
};
pub use link::{Link, Links};
pub use status::{Event, PotentialRights, Status, StatusDocument, StatusRel, Updated};
