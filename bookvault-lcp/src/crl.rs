//! The Certificate Revocation List service.
//!
//! Keeps one process-wide cached CRL plus its fetch timestamp. Revocation
//! checks refresh the cache when it is absent or older than the configured
//! freshness window, but a refresh failure falls back to the last-known
//! copy: offline reading must keep working, so a stale CRL only logs a
//! warning. Only the combination "no cache at all and the fetch failed"
//! surfaces an error, because revocation status is then truly unknown.

use crate::error::{LcpError, LcpResult};
use crate::network::{HttpTransport, Method};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

struct CrlCache {
    revoked: HashSet<String>,
    fetched_at: DateTime<Utc>,
}

/// Cached access to the provider's Certificate Revocation List.
pub struct CrlService {
    http: Arc<dyn HttpTransport>,
    url: String,
    max_age: Duration,
    cache: RwLock<Option<CrlCache>>,
}

impl CrlService {
    /// Creates the service. `max_age` is the freshness window beyond which
    /// a revocation check attempts a refresh.
    pub fn new(http: Arc<dyn HttpTransport>, url: String, max_age: Duration) -> Self {
        Self {
            http,
            url,
            max_age,
            cache: RwLock::new(None),
        }
    }

    /// Returns whether the certificate with the given serial is revoked.
    ///
    /// # Errors
    ///
    /// [`LcpError::CrlFetching`] when no cached CRL exists and the network
    /// refresh failed; revocation is then unknown and the validator must
    /// fail.
    pub async fn is_revoked(&self, serial: &str) -> LcpResult<bool> {
        {
            let cache = self.cache.read().await;
            if let Some(cache) = cache.as_ref() {
                if self.is_fresh(cache) {
                    return Ok(cache.revoked.contains(serial));
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(existing) = cache.as_ref() {
            if self.is_fresh(existing) {
                return Ok(existing.revoked.contains(serial));
            }
        }

        match self.fetch().await {
            Ok(revoked) => {
                let fresh = CrlCache {
                    revoked,
                    fetched_at: Utc::now(),
                };
                let result = fresh.revoked.contains(serial);
                *cache = Some(fresh);
                Ok(result)
            }
            Err(error) => match cache.as_ref() {
                Some(stale) => {
                    tracing::warn!(
                        fetched_at = %stale.fetched_at,
                        %error,
                        "CRL refresh failed, proceeding with stale cache"
                    );
                    Ok(stale.revoked.contains(serial))
                }
                None => {
                    tracing::warn!(%error, "CRL unavailable and no cache exists");
                    Err(LcpError::CrlFetching)
                }
            },
        }
    }

    fn is_fresh(&self, cache: &CrlCache) -> bool {
        let age = Utc::now() - cache.fetched_at;
        age.to_std().map(|age| age < self.max_age).unwrap_or(true)
    }

    async fn fetch(&self) -> LcpResult<HashSet<String>> {
        let response = self.http.request(Method::Get, &self.url, &[]).await?;
        if !response.is_success() {
            return Err(LcpError::Network(format!(
                "CRL fetch returned HTTP {}",
                response.status
            )));
        }

        let document: Value = serde_json::from_slice(&response.body)
            .map_err(|e| LcpError::Network(format!("invalid CRL document: {e}")))?;
        let revoked = document
            .get("revoked")
            .and_then(Value::as_array)
            .ok_or_else(|| LcpError::Network("CRL document has no revoked list".into()))?
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();
        Ok(revoked)
    }
}
