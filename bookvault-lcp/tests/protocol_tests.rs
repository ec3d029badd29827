mod common;

use bookvault_lcp::{
    DeviceLinkClient, LcpError, RenewError, ReqwestTransport, ReturnError,
};
use bookvault_license::{ParsingError, StatusDocument};
use chrono::{TimeZone, Utc};
use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> DeviceLinkClient {
    let http = Arc::new(ReqwestTransport::new(Duration::from_secs(5)).unwrap());
    DeviceLinkClient::new(http, test_device())
}

fn status_for(server: &MockServer, state: &str) -> StatusDocument {
    let body = serde_json::to_vec(&status_value(&server.uri(), state)).unwrap();
    StatusDocument::parse(&body).unwrap()
}

// ── Status fetch ────────────────────────────────────────────────

#[tokio::test]
async fn fetches_the_status_document_from_the_license_link() {
    let server = MockServer::start().await;
    mount_status(&server, "active").await;

    let license = parsed_license(&server.uri());
    let status = client().fetch_status(&license).await.unwrap();
    assert_eq!(status.id, LICENSE_ID);
}

#[tokio::test]
async fn rejects_a_status_document_for_a_different_license() {
    let server = MockServer::start().await;
    let mut body = status_value(&server.uri(), "active");
    body["id"] = "some-other-license".into();
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let error = client().fetch_status(&license).await.unwrap_err();
    assert!(matches!(
        error,
        LcpError::Parsing(ParsingError::StatusDocument)
    ));
}

// ── License fetch ───────────────────────────────────────────────

#[tokio::test]
async fn fetches_the_reissued_license_from_the_status_link() {
    let server = MockServer::start().await;
    let mut reissued = unsigned_license(&server.uri());
    reissued["updated"] = "2024-04-20T09:00:00Z".into();
    Mock::given(method("GET"))
        .and(path("/license"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sign_license(reissued, &default_certificate(), &provider_key()),
            "application/vnd.readium.lcp.license.v1.0+json",
        ))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let fresh = client().fetch_license(&license, &status).await.unwrap();
    assert_eq!(fresh.id, LICENSE_ID);
    assert!(fresh.updated_or_issued() > license.updated_or_issued());
}

#[tokio::test]
async fn rejects_a_reissued_license_with_a_different_id() {
    let server = MockServer::start().await;
    let mut other = unsigned_license(&server.uri());
    other["id"] = "some-other-license".into();
    Mock::given(method("GET"))
        .and(path("/license"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sign_license(other, &default_certificate(), &provider_key()),
            "application/vnd.readium.lcp.license.v1.0+json",
        ))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let error = client().fetch_license(&license, &status).await.unwrap_err();
    assert!(matches!(
        error,
        LcpError::Parsing(ParsingError::LicenseDocument)
    ));
}

// ── Register ────────────────────────────────────────────────────

#[tokio::test]
async fn register_sends_the_device_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(query_param("id", DEVICE_ID))
        .and(query_param("name", DEVICE_NAME))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_value(&server.uri(), "active")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "ready");
    let fresh = client().register(&license, &status).await.unwrap();
    assert_eq!(fresh.unwrap().id, LICENSE_ID);
}

#[tokio::test]
async fn register_recognizes_an_already_registered_problem_document() {
    let server = MockServer::start().await;
    mount_register_conflict(&server).await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let fresh = client().register(&license, &status).await.unwrap();
    assert!(fresh.is_none());
}

#[tokio::test]
async fn register_rejects_a_400_without_a_registration_problem() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(400).set_body_string("<html>Bad Request</html>"))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let error = client().register(&license, &status).await.unwrap_err();
    assert!(matches!(error, LcpError::Network(_)));
}

#[tokio::test]
async fn register_surfaces_server_errors_as_network_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let error = client().register(&license, &status).await.unwrap_err();
    assert!(matches!(error, LcpError::Network(_)));
}

// ── Renew ───────────────────────────────────────────────────────

#[tokio::test]
async fn renew_passes_the_preferred_end_date() {
    let server = MockServer::start().await;
    let end = Utc.with_ymd_and_hms(2024, 4, 15, 10, 0, 0).unwrap();
    Mock::given(method("PUT"))
        .and(path("/renew"))
        .and(query_param("id", DEVICE_ID))
        .and(query_param("end", "2024-04-15T10:00:00+00:00"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_value(&server.uri(), "active")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let fresh = client().renew(&license, &status, Some(end)).await.unwrap();
    assert_eq!(fresh.id, LICENSE_ID);
}

#[tokio::test]
async fn renew_maps_a_period_rejection_to_the_max_date_hint() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/renew"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "type": "http://readium.org/license-status-document/error/renew",
            "max_renew_date": "2024-05-01T10:00:00Z",
        })))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let error = client().renew(&license, &status, None).await.unwrap_err();
    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    assert!(matches!(
        error,
        LcpError::Renew(RenewError::InvalidRenewalPeriod {
            max_renew_date: Some(date)
        }) if date == expected
    ));
}

#[tokio::test]
async fn renew_maps_a_bare_400_to_a_plain_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/renew"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let error = client().renew(&license, &status, None).await.unwrap_err();
    assert!(matches!(error, LcpError::Renew(RenewError::RenewFailed)));
}

#[tokio::test]
async fn renew_maps_a_500_to_an_unexpected_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/renew"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let error = client().renew(&license, &status, None).await.unwrap_err();
    assert!(matches!(
        error,
        LcpError::Renew(RenewError::UnexpectedServerError)
    ));
}

#[tokio::test]
async fn renew_without_a_link_never_touches_the_network() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would fail the test as a 404 network
    // error rather than the expected missing-interaction error.
    let mut value = status_value(&server.uri(), "active");
    value["links"]
        .as_array_mut()
        .unwrap()
        .retain(|link| link["rel"] != "renew");
    let status = StatusDocument::parse(&serde_json::to_vec(&value).unwrap()).unwrap();

    let license = parsed_license(&server.uri());
    let error = client().renew(&license, &status, None).await.unwrap_err();
    assert!(matches!(error, LcpError::LicenseInteractionNotAvailable));
}

// ── Return ──────────────────────────────────────────────────────

#[tokio::test]
async fn return_reports_the_fresh_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/return"))
        .and(query_param("id", DEVICE_ID))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_value(&server.uri(), "returned")),
        )
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let fresh = client().return_license(&license, &status).await.unwrap();
    assert_eq!(fresh.status, bookvault_license::Status::Returned);
}

#[tokio::test]
async fn return_recognizes_an_already_returned_problem_document() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/return"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "type": "http://readium.org/license-status-document/error/return/already-returned",
        })))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let error = client().return_license(&license, &status).await.unwrap_err();
    assert!(matches!(
        error,
        LcpError::Return(ReturnError::AlreadyReturnedOrExpired)
    ));
}

#[tokio::test]
async fn return_maps_a_500_to_an_unexpected_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/return"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let license = parsed_license(&server.uri());
    let status = status_for(&server, "active");
    let error = client().return_license(&license, &status).await.unwrap_err();
    assert!(matches!(
        error,
        LcpError::Return(ReturnError::UnexpectedServerError)
    ));
}
