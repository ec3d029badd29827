//! Shared fixtures for the engine integration tests.
//!
//! Signing keys are deterministic so every run produces the same
//! signatures. The license server is simulated with wiremock; the license
//! and status fixtures take the mock server's base URL so every link in
//! the documents resolves to it.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use bookvault_crypto::{aes256_cbc_encrypt, hash_passphrase, UserKey};
use bookvault_lcp::{
    AuthenticationReason, DeviceService, LcpAuthenticating, LcpConfig, LcpService,
};
use bookvault_license::LicenseDocument;
use bookvault_store::{PassphraseRecord, Store};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LICENSE_ID: &str = "df09ac25-a386-4c5c-b167-33ce4c36ca65";
pub const PASSPHRASE: &str = "white rabbits in the snow";
pub const CERT_SERIAL: &str = "3124054";
pub const DEVICE_ID: &str = "device-1";
pub const DEVICE_NAME: &str = "Test device";

// ── Keys and certificates ───────────────────────────────────────

pub fn root_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

pub fn provider_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

/// Builds a `base64url(payload).base64url(signature)` provider
/// certificate signed by `root`.
pub fn certificate(
    root: &SigningKey,
    provider: &SigningKey,
    serial: &str,
    not_before: &str,
    not_after: &str,
) -> String {
    let payload = json!({
        "serial": serial,
        "subject": "https://provider.example.org",
        "public_key": STANDARD.encode(provider.verifying_key().as_bytes()),
        "not_before": not_before,
        "not_after": not_after,
    });
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    let signature = root.sign(payload_b64.as_bytes());
    format!(
        "{payload_b64}.{}",
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    )
}

/// The certificate most tests use: valid from 2024 through 2029.
pub fn default_certificate() -> String {
    certificate(
        &root_key(),
        &provider_key(),
        CERT_SERIAL,
        "2024-01-01T00:00:00Z",
        "2030-01-01T00:00:00Z",
    )
}

// ── License Documents ───────────────────────────────────────────

/// The plaintext content key wrapped inside the license fixtures.
pub fn content_key_bytes() -> Vec<u8> {
    vec![0xA7; 32]
}

/// A complete license object, minus the signature. The key check and the
/// wrapped content key are real ciphertexts under [`PASSPHRASE`].
pub fn unsigned_license(server_url: &str) -> Value {
    let user_key = UserKey::from_passphrase(PASSPHRASE);
    let key_check = aes256_cbc_encrypt(&user_key, &[3u8; 16], LICENSE_ID.as_bytes());
    let wrapped_key = aes256_cbc_encrypt(&user_key, &[5u8; 16], &content_key_bytes());

    json!({
        "id": LICENSE_ID,
        "issued": "2024-03-01T10:00:00Z",
        "provider": "https://provider.example.org",
        "user": { "id": "user-1138" },
        "rights": { "print": 10, "copy": 3 },
        "encryption": {
            "profile": "http://readium.org/lcp/basic-profile",
            "content_key": {
                "algorithm": "http://www.w3.org/2001/04/xmlenc#aes256-cbc",
                "encrypted_value": STANDARD.encode(wrapped_key),
            },
            "user_key": {
                "algorithm": "http://www.w3.org/2001/04/xmlenc#sha256",
                "text_hint": "A season, in lowercase",
                "key_check": STANDARD.encode(key_check),
            },
        },
        "links": [
            {
                "rel": "hint",
                "href": format!("{server_url}/hint"),
                "type": "text/html",
            },
            {
                "rel": "status",
                "href": format!("{server_url}/status"),
                "type": "application/vnd.readium.license.status.v1.0+json",
            },
        ],
    })
}

/// Signs a license object: the signature covers the serialized document
/// with the `signature` member absent, keys sorted.
pub fn sign_license(mut license: Value, certificate: &str, provider: &SigningKey) -> Vec<u8> {
    license.as_object_mut().unwrap().remove("signature");
    let canonical = serde_json::to_vec(&license).unwrap();
    let signature = provider.sign(&canonical);
    license["signature"] = json!({
        "algorithm": "http://www.w3.org/2001/04/xmldsig-more#ed25519",
        "certificate": STANDARD.encode(certificate.as_bytes()),
        "value": STANDARD.encode(signature.to_bytes()),
    });
    serde_json::to_vec(&license).unwrap()
}

/// A fully signed, valid `.lcpl` payload.
pub fn signed_license(server_url: &str) -> Vec<u8> {
    sign_license(
        unsigned_license(server_url),
        &default_certificate(),
        &provider_key(),
    )
}

pub fn parsed_license(server_url: &str) -> LicenseDocument {
    LicenseDocument::parse(&signed_license(server_url)).unwrap()
}

// ── Status Documents ────────────────────────────────────────────

/// A Status Document with all three interaction links, in the given state.
pub fn status_value(server_url: &str, status: &str) -> Value {
    json!({
        "id": LICENSE_ID,
        "status": status,
        "updated": {
            "license": "2024-03-01T10:00:00Z",
            "status": "2024-03-05T16:10:00Z"
        },
        "links": [
            {
                "rel": "license",
                "href": format!("{server_url}/license"),
                "type": "application/vnd.readium.lcp.license.v1.0+json",
            },
            {
                "rel": "register",
                "href": format!("{server_url}/register{{?id,name}}"),
                "templated": true,
            },
            {
                "rel": "renew",
                "href": format!("{server_url}/renew{{?end,id,name}}"),
                "templated": true,
            },
            {
                "rel": "return",
                "href": format!("{server_url}/return{{?id,name}}"),
                "templated": true,
            },
        ],
        "potential_rights": {
            "end": "2024-05-01T10:00:00Z"
        },
    })
}

// ── Wiremock helpers ────────────────────────────────────────────

pub fn crl_body(revoked: &[&str]) -> Value {
    json!({
        "updated": "2024-03-01T00:00:00Z",
        "revoked": revoked,
    })
}

pub async fn mount_crl(server: &MockServer, revoked: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/crl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(crl_body(revoked)))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, status: &str) {
    let body = status_value(&server.uri(), status);
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// The registration endpoint answering "this device is already known".
pub async fn mount_register_conflict(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "type": "http://readium.org/license-status-document/error/registration",
            "title": "The device has already been registered",
        })))
        .mount(server)
        .await;
}

// ── Engine construction ─────────────────────────────────────────

pub fn config_for(server_url: &str) -> LcpConfig {
    LcpConfig {
        crl_url: format!("{server_url}/crl"),
        crl_max_age: Duration::from_secs(3600),
        http_timeout: Duration::from_secs(5),
        root_certificate: root_key().verifying_key().to_bytes(),
    }
}

pub fn test_device() -> DeviceService {
    DeviceService::new(DEVICE_ID.to_string(), DEVICE_NAME.to_string())
}

pub fn service(
    server_url: &str,
    store: Store,
    authentication: Arc<dyn LcpAuthenticating>,
) -> LcpService {
    // Set RUST_LOG to see engine output from a failing test.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    LcpService::new(config_for(server_url), store, authentication, test_device()).unwrap()
}

/// Seeds the store so the fixture license unlocks without prompting.
pub fn seed_passphrase(store: &Store) {
    store
        .passphrases()
        .add(&PassphraseRecord {
            license_id: LICENSE_ID.to_string(),
            provider: Some("https://provider.example.org".to_string()),
            user_id: Some("user-1138".to_string()),
            passphrase_hash: hash_passphrase(PASSPHRASE).as_hex().to_string(),
        })
        .unwrap();
}

// ── Authenticating collaborators ────────────────────────────────

/// Fails the test if the engine prompts: used when a silent unlock is
/// expected.
pub struct NoPrompt;

#[async_trait]
impl LcpAuthenticating for NoPrompt {
    async fn request_passphrase(
        &self,
        _license: &LicenseDocument,
        _reason: AuthenticationReason,
    ) -> Option<String> {
        panic!("the engine prompted for a passphrase when a silent unlock was expected");
    }
}

/// Always declines the prompt.
pub struct Declining;

#[async_trait]
impl LcpAuthenticating for Declining {
    async fn request_passphrase(
        &self,
        _license: &LicenseDocument,
        _reason: AuthenticationReason,
    ) -> Option<String> {
        None
    }
}

/// Answers the prompts from a script, recording the reason of each one.
pub struct ScriptedAuthentication {
    answers: Mutex<Vec<Option<String>>>,
    pub reasons: Mutex<Vec<AuthenticationReason>>,
}

impl ScriptedAuthentication {
    /// `answers` are handed out in order; a call past the end declines.
    pub fn new(answers: Vec<Option<&str>>) -> Self {
        Self {
            answers: Mutex::new(
                answers
                    .into_iter()
                    .rev()
                    .map(|answer| answer.map(String::from))
                    .collect(),
            ),
            reasons: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LcpAuthenticating for ScriptedAuthentication {
    async fn request_passphrase(
        &self,
        _license: &LicenseDocument,
        reason: AuthenticationReason,
    ) -> Option<String> {
        self.reasons.lock().unwrap().push(reason);
        self.answers.lock().unwrap().pop().flatten()
    }
}
