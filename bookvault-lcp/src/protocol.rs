//! The device-link protocol client.
//!
//! Drives the register, renew and return interactions against the links
//! exposed by the current Status Document, and re-parses the status
//! response each call returns. A missing link surfaces
//! [`LcpError::LicenseInteractionNotAvailable`] without touching the
//! network.

use crate::device::DeviceService;
use crate::error::{LcpError, LcpResult, RenewError, ReturnError};
use crate::network::{HttpTransport, Method};
use bookvault_license::{
    LicenseDocument, LicenseRel, ParsingError, StatusDocument, StatusRel,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// HTTP client for the license-server interactions.
pub struct DeviceLinkClient {
    http: Arc<dyn HttpTransport>,
    device: DeviceService,
}

impl DeviceLinkClient {
    pub fn new(http: Arc<dyn HttpTransport>, device: DeviceService) -> Self {
        Self { http, device }
    }

    /// The device identity used for the protocol calls.
    #[must_use]
    pub fn device(&self) -> &DeviceService {
        &self.device
    }

    /// Fetches the Status Document from the license's `status` link.
    pub async fn fetch_status(&self, license: &LicenseDocument) -> LcpResult<StatusDocument> {
        let url = license
            .url(LicenseRel::Status, &[])
            .ok_or(LcpError::LicenseInteractionNotAvailable)?;
        let response = self.http.request(Method::Get, &url, &[]).await?;
        if !response.is_success() {
            return Err(LcpError::Network(format!(
                "status fetch returned HTTP {}",
                response.status
            )));
        }
        parse_status(&response.body, &license.id)
    }

    /// Fetches the reissued License Document advertised by a Status
    /// Document, falling back to the license's own `license` link.
    pub async fn fetch_license(
        &self,
        license: &LicenseDocument,
        status: &StatusDocument,
    ) -> LcpResult<LicenseDocument> {
        let url = status
            .url(StatusRel::License, &[])
            .or_else(|| license.url(LicenseRel::License, &[]))
            .ok_or(LcpError::LicenseInteractionNotAvailable)?;
        let response = self.http.request(Method::Get, &url, &[]).await?;
        if !response.is_success() {
            return Err(LcpError::Network(format!(
                "license fetch returned HTTP {}",
                response.status
            )));
        }
        let fresh = LicenseDocument::parse(&response.body)?;
        if fresh.id != license.id {
            return Err(ParsingError::LicenseDocument.into());
        }
        Ok(fresh)
    }

    /// Registers this device. A 400-class response whose problem document
    /// reports a registration conflict is treated as "already registered"
    /// and reported as success without a fresh document.
    pub async fn register(
        &self,
        license: &LicenseDocument,
        status: &StatusDocument,
    ) -> LcpResult<Option<StatusDocument>> {
        let url = status
            .url(StatusRel::Register, &self.device.as_query_parameters())
            .ok_or(LcpError::LicenseInteractionNotAvailable)?;

        let response = self.http.request(Method::Post, &url, &[]).await?;
        match response.status {
            200..=299 => Ok(Some(parse_status(&response.body, &license.id)?)),
            400..=499 if indicates_already_registered(&response.body) => {
                tracing::debug!(license_id = %license.id, status = response.status,
                    "device already registered");
                Ok(None)
            }
            status => Err(LcpError::Network(format!(
                "registration returned HTTP {status}"
            ))),
        }
    }

    /// Extends the loan, optionally to a preferred end date.
    pub async fn renew(
        &self,
        license: &LicenseDocument,
        status: &StatusDocument,
        end: Option<DateTime<Utc>>,
    ) -> LcpResult<StatusDocument> {
        let link = status
            .link(StatusRel::Renew)
            .ok_or(LcpError::LicenseInteractionNotAvailable)?;

        let end = end.map(|end| end.to_rfc3339());
        let mut parameters = self.device.as_query_parameters();
        if let Some(end) = end.as_deref() {
            parameters.push(("end", end));
        }
        let url = link.url(&parameters);

        let response = self.http.request(Method::Put, &url, &[]).await?;
        match response.status {
            200..=299 => parse_status(&response.body, &license.id),
            400 => match max_renew_date(&response.body) {
                Some(max_renew_date) => Err(RenewError::InvalidRenewalPeriod {
                    max_renew_date: Some(max_renew_date),
                }
                .into()),
                None => Err(RenewError::RenewFailed.into()),
            },
            500..=599 => Err(RenewError::UnexpectedServerError.into()),
            _ => Err(RenewError::RenewFailed.into()),
        }
    }

    /// Returns the publication early.
    pub async fn return_license(
        &self,
        license: &LicenseDocument,
        status: &StatusDocument,
    ) -> LcpResult<StatusDocument> {
        let url = status
            .url(StatusRel::Return, &self.device.as_query_parameters())
            .ok_or(LcpError::LicenseInteractionNotAvailable)?;

        let response = self.http.request(Method::Put, &url, &[]).await?;
        match response.status {
            200..=299 => parse_status(&response.body, &license.id),
            400 => {
                if indicates_returned_or_expired(&response.body) {
                    Err(ReturnError::AlreadyReturnedOrExpired.into())
                } else {
                    Err(ReturnError::ReturnFailed.into())
                }
            }
            500..=599 => Err(ReturnError::UnexpectedServerError.into()),
            _ => Err(ReturnError::ReturnFailed.into()),
        }
    }
}

fn parse_status(body: &[u8], license_id: &str) -> LcpResult<StatusDocument> {
    let status = StatusDocument::parse(body)?;
    if status.id != license_id {
        return Err(ParsingError::StatusDocument.into());
    }
    Ok(status)
}

/// Extracts the max-date hint from a renewal problem document, if present.
fn max_renew_date(body: &[u8]) -> Option<DateTime<Utc>> {
    let document: Value = serde_json::from_slice(body).ok()?;
    let date = document.get("max_renew_date").and_then(Value::as_str)?;
    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// True when a registration problem document reports a prior registration.
fn indicates_already_registered(body: &[u8]) -> bool {
    let Ok(document) = serde_json::from_slice::<Value>(body) else {
        return false;
    };
    document
        .get("type")
        .and_then(Value::as_str)
        .map(|t| t.contains("registration"))
        .unwrap_or(false)
}

/// True when a return problem document reports a prior return or expiry.
fn indicates_returned_or_expired(body: &[u8]) -> bool {
    let Ok(document) = serde_json::from_slice::<Value>(body) else {
        return false;
    };
    document
        .get("type")
        .and_then(Value::as_str)
        .map(|t| t.contains("returned") || t.contains("expired"))
        .unwrap_or(false)
}
