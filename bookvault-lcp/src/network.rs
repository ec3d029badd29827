//! The HTTP transport seam.
//!
//! The engine never talks to `reqwest` directly: the CRL service and the
//! device-link protocol client go through [`HttpTransport`], so tests can
//! swap in a local server and transport failures surface uniformly as
//! [`LcpError::Network`].

use crate::error::{LcpError, LcpResult};
use async_trait::async_trait;
use std::time::Duration;

/// HTTP methods used by the LCP protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

/// A completed HTTP exchange. Non-2xx statuses are returned, not errors:
/// the protocol client maps them to domain outcomes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract HTTP transport.
///
/// Implementations must enforce a timeout; an abandoned call must not keep
/// a license mutex held indefinitely.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// [`LcpError::Network`] for transport-level failures (timeout, DNS,
    /// TLS). These are the only errors eligible for caller-driven retry.
    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
    ) -> LcpResult<HttpResponse>;
}

/// The production transport, backed by `reqwest` with rustls.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with the given request timeout.
    pub fn new(timeout: Duration) -> LcpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LcpError::Runtime(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
    ) -> LcpResult<HttpResponse> {
        let mut request = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
        };
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LcpError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| LcpError::Network(e.to_string()))?
            .to_vec();

        tracing::debug!(%url, status, "http exchange");
        Ok(HttpResponse { status, body })
    }
}
