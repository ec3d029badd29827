//! The License Document model (`.lcpl`).
//!
//! A License Document is a signed JSON object asserting usage rights and
//! carrying the encrypted content key. Required fields are `id`,
//! `encryption`, `signature` and a `hint` link; a document missing any of
//! them is rejected at construction.

use crate::error::{ParsingError, ParsingResult};
use crate::link::{Link, Links};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Link relations used in a License Document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseRel {
    /// A resource hinting the user passphrase. Required.
    Hint,
    /// The protected publication to download.
    Publication,
    /// The Status Document for this license.
    Status,
    /// The canonical location of the License Document itself.
    License,
}

impl LicenseRel {
    /// The relation name as it appears in the JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hint => "hint",
            Self::Publication => "publication",
            Self::Status => "status",
            Self::License => "license",
        }
    }
}

/// Identification of the user a license is issued to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Consumable quotas and time bounds granted by a license.
///
/// `None` quotas are unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rights {
    /// Maximum number of pages that can be printed.
    pub print: Option<i64>,
    /// Maximum number of characters that can be copied.
    pub copy: Option<i64>,
    /// Date the license starts being valid.
    pub start: Option<DateTime<Utc>>,
    /// Date the license expires.
    pub end: Option<DateTime<Utc>>,
}

/// The encrypted content key and how to unwrap it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentKey {
    /// Encryption algorithm URI.
    pub algorithm: String,
    /// Content key, encrypted with the user key.
    pub encrypted_value: Vec<u8>,
}

/// The user-key parameters: how a passphrase is turned into a key, and the
/// check value used to recognize the right one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKey {
    /// Key derivation algorithm URI.
    pub algorithm: String,
    /// Hint to display to the user when prompting for the passphrase.
    pub text_hint: String,
    /// The license id encrypted with the user key. Decrypting it back to
    /// the id proves a candidate passphrase is correct.
    pub key_check: Vec<u8>,
}

/// The `encryption` object of a License Document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encryption {
    /// Encryption profile URI (e.g. the LCP basic profile).
    pub profile: String,
    pub content_key: ContentKey,
    pub user_key: UserKey,
}

/// The provider signature over the canonical form of the license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Signature algorithm URI.
    pub algorithm: String,
    /// The provider certificate, chaining to the trusted root.
    pub certificate: Vec<u8>,
    /// The signature value.
    pub value: Vec<u8>,
}

/// An immutable, parsed License Document.
#[derive(Debug, Clone, PartialEq)]
pub struct LicenseDocument {
    pub id: String,
    pub issued: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    /// URI identifying the content provider.
    pub provider: String,
    pub user: Option<User>,
    pub rights: Rights,
    pub encryption: Encryption,
    pub links: Links,
    pub signature: Signature,
    /// The document as parsed, kept for serialization and signing.
    json: Value,
}

impl LicenseDocument {
    /// Parses a License Document from raw bytes.
    ///
    /// Pure function: no I/O, no side effects.
    ///
    /// # Errors
    ///
    /// [`ParsingError::MalformedJson`] if the payload is not well-formed
    /// JSON, [`ParsingError::LicenseDocument`] if a required field is
    /// absent, and [`ParsingError::Link`] / [`ParsingError::Encryption`] /
    /// [`ParsingError::Signature`] for malformed sub-objects.
    pub fn parse(data: &[u8]) -> ParsingResult<Self> {
        let json: Value =
            serde_json::from_slice(data).map_err(ParsingError::MalformedJson)?;
        let obj = json.as_object().ok_or(ParsingError::LicenseDocument)?;

        let id = required_str(obj, "id").ok_or(ParsingError::LicenseDocument)?;
        let issued = required_str(obj, "issued")
            .and_then(|s| parse_date(&s))
            .ok_or(ParsingError::LicenseDocument)?;
        let updated = obj
            .get("updated")
            .and_then(Value::as_str)
            .map(|s| parse_date(s).ok_or(ParsingError::LicenseDocument))
            .transpose()?;
        let provider = required_str(obj, "provider").ok_or(ParsingError::LicenseDocument)?;

        let user = obj.get("user").map(parse_user).transpose()?;
        let rights = obj
            .get("rights")
            .map(parse_rights)
            .transpose()?
            .unwrap_or_default();

        let encryption =
            parse_encryption(obj.get("encryption").ok_or(ParsingError::LicenseDocument)?)?;
        let signature =
            parse_signature(obj.get("signature").ok_or(ParsingError::LicenseDocument)?)?;

        let links = Links::parse(obj.get("links").ok_or(ParsingError::LicenseDocument)?)?;
        if !links.contains_rel(LicenseRel::Hint.as_str()) {
            return Err(ParsingError::LicenseDocument);
        }

        Ok(Self {
            id,
            issued,
            updated,
            provider,
            user,
            rights,
            encryption,
            links,
            signature,
            json,
        })
    }

    /// Returns the first link with the given relation.
    #[must_use]
    pub fn link(&self, rel: LicenseRel) -> Option<&Link> {
        self.links.first_with_rel(rel.as_str())
    }

    /// Resolves the URL of the first link with the given relation.
    #[must_use]
    pub fn url(&self, rel: LicenseRel, parameters: &[(&str, &str)]) -> Option<String> {
        self.link(rel).map(|link| link.url(parameters))
    }

    /// The date the license was last updated, falling back to `issued`.
    #[must_use]
    pub fn updated_or_issued(&self) -> DateTime<Utc> {
        self.updated.unwrap_or(self.issued)
    }

    /// Serializes the document back to its JSON byte form.
    ///
    /// Keys are emitted in sorted order, so `parse(to_bytes())` round-trips
    /// to an equal document.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.json).unwrap_or_default()
    }

    /// The canonical byte form the provider signature covers: the document
    /// with the `signature` member removed, keys sorted, no whitespace.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut canonical = self.json.clone();
        if let Some(obj) = canonical.as_object_mut() {
            obj.remove("signature");
        }
        serde_json::to_vec(&canonical).unwrap_or_default()
    }
}

fn required_str(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn parse_user(value: &Value) -> ParsingResult<User> {
    let obj = value.as_object().ok_or(ParsingError::LicenseDocument)?;
    Ok(User {
        id: obj.get("id").and_then(Value::as_str).map(String::from),
        name: obj.get("name").and_then(Value::as_str).map(String::from),
        email: obj.get("email").and_then(Value::as_str).map(String::from),
    })
}

fn parse_rights(value: &Value) -> ParsingResult<Rights> {
    let obj = value.as_object().ok_or(ParsingError::LicenseDocument)?;
    let date = |key: &str| -> ParsingResult<Option<DateTime<Utc>>> {
        obj.get(key)
            .and_then(Value::as_str)
            .map(|s| parse_date(s).ok_or(ParsingError::LicenseDocument))
            .transpose()
    };
    Ok(Rights {
        print: obj.get("print").and_then(Value::as_i64),
        copy: obj.get("copy").and_then(Value::as_i64),
        start: date("start")?,
        end: date("end")?,
    })
}

fn parse_encryption(value: &Value) -> ParsingResult<Encryption> {
    let obj = value.as_object().ok_or(ParsingError::Encryption)?;
    let profile = required_str(obj, "profile").ok_or(ParsingError::Encryption)?;

    let content_key = obj
        .get("content_key")
        .and_then(Value::as_object)
        .ok_or(ParsingError::Encryption)?;
    let user_key = obj
        .get("user_key")
        .and_then(Value::as_object)
        .ok_or(ParsingError::Encryption)?;

    Ok(Encryption {
        profile,
        content_key: ContentKey {
            algorithm: required_str(content_key, "algorithm").ok_or(ParsingError::Encryption)?,
            encrypted_value: required_base64(content_key, "encrypted_value")
                .ok_or(ParsingError::Encryption)?,
        },
        user_key: UserKey {
            algorithm: required_str(user_key, "algorithm").ok_or(ParsingError::Encryption)?,
            text_hint: required_str(user_key, "text_hint").ok_or(ParsingError::Encryption)?,
            key_check: required_base64(user_key, "key_check").ok_or(ParsingError::Encryption)?,
        },
    })
}

fn parse_signature(value: &Value) -> ParsingResult<Signature> {
    let obj = value.as_object().ok_or(ParsingError::Signature)?;
    Ok(Signature {
        algorithm: required_str(obj, "algorithm").ok_or(ParsingError::Signature)?,
        certificate: required_base64(obj, "certificate").ok_or(ParsingError::Signature)?,
        value: required_base64(obj, "value").ok_or(ParsingError::Signature)?,
    })
}

fn required_base64(obj: &serde_json::Map<String, Value>, key: &str) -> Option<Vec<u8>> {
    obj.get(key)
        .and_then(Value::as_str)
        .and_then(|s| STANDARD.decode(s).ok())
}
