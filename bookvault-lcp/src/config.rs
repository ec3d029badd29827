//! Engine configuration.

use std::time::Duration;

/// The default CRL distribution point.
pub const DEFAULT_CRL_URL: &str = "https://crl.edrlab.org/lcp/crl.json";

/// Configuration for the LCP engine, injected at service construction.
#[derive(Debug, Clone)]
pub struct LcpConfig {
    /// Where to fetch the Certificate Revocation List.
    pub crl_url: String,
    /// Freshness window for the cached CRL. Beyond this age a revocation
    /// check attempts a refresh; a stale cache is still preferred to
    /// failing closed, so offline reading keeps working.
    pub crl_max_age: Duration,
    /// Timeout applied to every HTTP request.
    pub http_timeout: Duration,
    /// Root CA public key used for certificate chain verification.
    pub root_certificate: [u8; 32],
}

impl Default for LcpConfig {
    fn default() -> Self {
        Self {
            crl_url: DEFAULT_CRL_URL.to_string(),
            crl_max_age: Duration::from_secs(7 * 24 * 60 * 60),
            http_timeout: Duration::from_secs(30),
            root_certificate: PRODUCTION_ROOT_KEY,
        }
    }
}

/// Embedded Ed25519 public key of the production root CA (32 bytes).
const PRODUCTION_ROOT_KEY: [u8; 32] = [
    121, 4, 214, 83, 156, 19, 247, 98, 160, 46, 208, 111, 52, 69, 195, 184,
    17, 230, 141, 76, 9, 158, 223, 34, 102, 240, 88, 167, 201, 55, 148, 29,
];
