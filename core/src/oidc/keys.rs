//! Public key retrieval
//!
//! Downloads PEM encoded P-256 public keys, retrying transient failures and
//! caching every key that parses.

use std::sync::Arc;

use p256::pkcs8::DecodePublicKey;
use p256::PublicKey;
use tracing::debug;

use super::cache::KeyCache;
use crate::context::Context;
use crate::error::{FetchError, Result, ValidationError};
use crate::platform::HttpClient;
use crate::retry::{RetryError, RetryPolicy};

pub struct KeyFetcher {
    http: Arc<dyn HttpClient>,
    cache: KeyCache,
    retry: RetryPolicy,
}

impl KeyFetcher {
    pub fn new(http: Arc<dyn HttpClient>, cache: KeyCache, retry: RetryPolicy) -> Self {
        Self { http, cache, retry }
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }

    /// Cached key for `url`, fetching it on a miss
    pub async fn get_or_fetch(&self, ctx: &Context, url: &str) -> Result<Arc<PublicKey>> {
        if let Some(key) = self.cache.get(url).await {
            debug!(url = %url, "public key cache hit");
            return Ok(key);
        }
        debug!(url = %url, "public key cache miss");
        self.fetch(ctx, url).await
    }

    /// Download and cache the key at `url`, bypassing the cache lookup
    pub async fn fetch(&self, ctx: &Context, url: &str) -> Result<Arc<PublicKey>> {
        let key = self
            .retry
            .retry(ctx, "fetch_public_key", || fetch_public_key(self.http.as_ref(), url))
            .await
            .map_err(|e| {
                let attempts = e.attempts();
                let source = match e {
                    RetryError::Exhausted { last, .. } => last,
                    RetryError::Permanent { error, .. } => error,
                    RetryError::Interrupted { reason, .. } => FetchError::Context(reason),
                };
                ValidationError::key_fetch_failed(url, attempts, source)
            })?;

        let key = Arc::new(key);
        self.cache.put(url, key.clone()).await;
        debug!(url = %url, "public key fetched");

        Ok(key)
    }
}

/// One GET of a PEM public key
async fn fetch_public_key(http: &dyn HttpClient, url: &str) -> std::result::Result<PublicKey, FetchError> {
    let response = http
        .get(url, &[("Accept", "application/x-pem-file, text/plain"), ("User-Agent", "alb-oidc")])
        .await?;

    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }

    let pem = response
        .text()
        .map_err(|e| FetchError::invalid_key(format!("body is not UTF-8: {}", e)))?;

    parse_public_key_pem(pem)
}

/// Parse a SubjectPublicKeyInfo PEM block holding a P-256 key
pub fn parse_public_key_pem(pem: &str) -> std::result::Result<PublicKey, FetchError> {
    PublicKey::from_public_key_pem(pem.trim()).map_err(|e| FetchError::invalid_key(e.to_string()))
}
