//! The Status Document model and lifecycle states.
//!
//! A Status Document is fetched from the license server and reports the
//! current state of a loan. It is immutable: every successful fetch creates
//! a new document which supersedes the previous one, and a fetch older than
//! the one already held (by `updated.status`) must be discarded.

use crate::error::{ParsingError, ParsingResult};
use crate::link::{Link, Links};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The lifecycle state of a license, as asserted by the server.
///
/// `Ready → Active → {Revoked, Returned, Cancelled, Expired}`. Revoked,
/// Returned and Cancelled are absorbing: no renew or return succeeds once
/// one of them is reached. Expired may be left again through a successful
/// renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The license is ready but the device has not used it yet.
    Ready,
    /// The license is in use on at least one device.
    Active,
    /// The provider revoked the license.
    Revoked,
    /// The user returned the publication.
    Returned,
    /// The provider cancelled the loan before it started.
    Cancelled,
    /// The loan end date has passed.
    Expired,
}

impl Status {
    /// True for the absorbing states, from which no renew or return can
    /// succeed regardless of link presence.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Revoked | Self::Returned | Self::Cancelled)
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "ready" => Some(Self::Ready),
            "active" => Some(Self::Active),
            "revoked" => Some(Self::Revoked),
            "returned" => Some(Self::Returned),
            "cancelled" => Some(Self::Cancelled),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Link relations used in a Status Document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRel {
    /// Registers a device with the license server.
    Register,
    /// Extends the loan end date.
    Renew,
    /// Returns the publication early.
    Return,
    /// The up-to-date License Document.
    License,
}

impl StatusRel {
    /// The relation name as it appears in the JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Renew => "renew",
            Self::Return => "return",
            Self::License => "license",
        }
    }
}

/// Timestamps of the last license and status updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Updated {
    pub license: DateTime<Utc>,
    pub status: DateTime<Utc>,
}

/// Rights the server may grant through a renewal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PotentialRights {
    /// The maximum date a renewal can extend the loan to.
    pub end: Option<DateTime<Utc>>,
}

/// A server-logged lifecycle event (registration, renewal, return, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event type (`register`, `renew`, `return`, `revoke`, `cancel`).
    pub event_type: String,
    /// Name of the device which triggered the event.
    pub name: Option<String>,
    /// Identifier of the device which triggered the event.
    pub device_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// An immutable, parsed Status Document.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusDocument {
    /// Identifier of the license this status belongs to.
    pub id: String,
    pub status: Status,
    /// A server-provided message meant for the end user.
    pub message: Option<String>,
    pub updated: Updated,
    pub links: Links,
    pub potential_rights: PotentialRights,
    /// Ordered lifecycle events, oldest first.
    pub events: Vec<Event>,
}

impl StatusDocument {
    /// Parses a Status Document from raw bytes.
    ///
    /// # Errors
    ///
    /// [`ParsingError::MalformedJson`] for ill-formed JSON,
    /// [`ParsingError::StatusDocument`] for missing required fields.
    pub fn parse(data: &[u8]) -> ParsingResult<Self> {
        let json: Value =
            serde_json::from_slice(data).map_err(ParsingError::MalformedJson)?;
        let obj = json.as_object().ok_or(ParsingError::StatusDocument)?;

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or(ParsingError::StatusDocument)?
            .to_string();
        let status = obj
            .get("status")
            .and_then(Value::as_str)
            .and_then(Status::parse)
            .ok_or(ParsingError::StatusDocument)?;
        let message = obj.get("message").and_then(Value::as_str).map(String::from);

        let updated_obj = obj
            .get("updated")
            .and_then(Value::as_object)
            .ok_or(ParsingError::StatusDocument)?;
        let updated = Updated {
            license: parse_date(updated_obj.get("license"))
                .ok_or(ParsingError::StatusDocument)?,
            status: parse_date(updated_obj.get("status"))
                .ok_or(ParsingError::StatusDocument)?,
        };

        let links = obj
            .get("links")
            .map(Links::parse)
            .transpose()?
            .unwrap_or_default();

        let potential_rights = PotentialRights {
            end: obj
                .get("potential_rights")
                .and_then(Value::as_object)
                .and_then(|pr| parse_date(pr.get("end"))),
        };

        let events = obj
            .get("events")
            .and_then(Value::as_array)
            .map(|array| array.iter().filter_map(parse_event).collect())
            .unwrap_or_default();

        Ok(Self {
            id,
            status,
            message,
            updated,
            links,
            potential_rights,
            events,
        })
    }

    /// Returns the first link with the given relation.
    #[must_use]
    pub fn link(&self, rel: StatusRel) -> Option<&Link> {
        self.links.first_with_rel(rel.as_str())
    }

    /// Resolves the URL of the first link with the given relation.
    #[must_use]
    pub fn url(&self, rel: StatusRel, parameters: &[(&str, &str)]) -> Option<String> {
        self.link(rel).map(|link| link.url(parameters))
    }

    /// True if this document is a strictly fresher fetch than `other`,
    /// comparing `updated.status` timestamps.
    #[must_use]
    pub fn supersedes(&self, other: &StatusDocument) -> bool {
        self.updated.status > other.updated.status
    }

    /// Returns the events of the given type, oldest first.
    pub fn events_of_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events
            .iter()
            .filter(move |event| event.event_type == event_type)
    }

    /// Number of devices which registered with the server, derived from the
    /// `register` events. Used for the revocation user message.
    #[must_use]
    pub fn registered_devices(&self) -> usize {
        self.events_of_type("register").count()
    }
}

fn parse_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

fn parse_event(value: &Value) -> Option<Event> {
    let obj = value.as_object()?;
    Some(Event {
        event_type: obj.get("type").and_then(Value::as_str)?.to_string(),
        name: obj.get("name").and_then(Value::as_str).map(String::from),
        device_id: obj.get("id").and_then(Value::as_str).map(String::from),
        timestamp: parse_date(obj.get("timestamp")),
    })
}
