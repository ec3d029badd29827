//! Shared fixtures for the document model tests.

#![allow(dead_code)]

use serde_json::{json, Value};

/// A complete, well-formed License Document as a JSON value.
pub fn license_value() -> Value {
    json!({
        "id": "df09ac25-a386-4c5c-b167-33ce4c36ca65",
        "issued": "2024-03-01T10:00:00Z",
        "updated": "2024-03-02T09:30:00Z",
        "provider": "https://provider.example.org",
        "user": {
            "id": "user-1138",
            "name": "Reader",
            "email": "reader@example.org"
        },
        "rights": {
            "print": 10,
            "copy": 2048,
            "start": "2024-03-01T10:00:00Z",
            "end": "2024-04-01T10:00:00Z"
        },
        "encryption": {
            "profile": "http://readium.org/lcp/basic-profile",
            "content_key": {
                "algorithm": "http://www.w3.org/2001/04/xmlenc#aes256-cbc",
                "encrypted_value": "q2hKLvYdRMCXLGmHpGAFtw=="
            },
            "user_key": {
                "algorithm": "http://www.w3.org/2001/04/xmlenc#sha256",
                "text_hint": "The title of the first chapter",
                "key_check": "XW3MdvGFJPT4Y6q0QEp3bQ=="
            }
        },
        "links": [
            {
                "rel": "hint",
                "href": "https://provider.example.org/hint",
                "type": "text/html"
            },
            {
                "rel": "publication",
                "href": "https://provider.example.org/pub.epub",
                "type": "application/epub+zip"
            },
            {
                "rel": "status",
                "href": "https://provider.example.org/status/df09ac25",
                "type": "application/vnd.readium.license.status.v1.0+json"
            }
        ],
        "signature": {
            "algorithm": "http://www.w3.org/2001/04/xmldsig-more#ed25519",
            "certificate": "cGF5bG9hZC5zaWduYXR1cmU=",
            "value": "c2lnbmF0dXJlLWJ5dGVz"
        }
    })
}

/// A complete, well-formed Status Document as a JSON value.
pub fn status_value() -> Value {
    json!({
        "id": "df09ac25-a386-4c5c-b167-33ce4c36ca65",
        "status": "active",
        "message": "The license is active",
        "updated": {
            "license": "2024-03-02T09:30:00Z",
            "status": "2024-03-05T16:10:00Z"
        },
        "links": [
            {
                "rel": "license",
                "href": "https://provider.example.org/license/df09ac25",
                "type": "application/vnd.readium.lcp.license.v1.0+json"
            },
            {
                "rel": "register",
                "href": "https://provider.example.org/register{?id,name}",
                "templated": true
            },
            {
                "rel": "renew",
                "href": "https://provider.example.org/renew{?end,id,name}",
                "templated": true
            },
            {
                "rel": "return",
                "href": "https://provider.example.org/return{?id,name}",
                "templated": true
            }
        ],
        "potential_rights": {
            "end": "2024-05-01T10:00:00Z"
        },
        "events": [
            {
                "type": "register",
                "name": "Living-room tablet",
                "id": "device-1",
                "timestamp": "2024-03-02T10:00:00Z"
            },
            {
                "type": "register",
                "name": "Phone",
                "id": "device-2",
                "timestamp": "2024-03-03T11:00:00Z"
            },
            {
                "type": "renew",
                "name": "Phone",
                "id": "device-2",
                "timestamp": "2024-03-04T12:00:00Z"
            }
        ]
    })
}

pub fn to_bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}
