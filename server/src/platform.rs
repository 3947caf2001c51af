//! Native platform implementations
//!
//! Implements core platform traits using native Rust libraries:
//! - HttpClient: reqwest (rustls, so key server certificates are verified)
//! - Clock: std::time::SystemTime

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alb_oidc_core::error::FetchError;
use alb_oidc_core::platform::{Clock, HttpClient, HttpResponse};

/// reqwest-based HTTP client
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::transport(format!("HTTP GET failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(format!("failed to read response: {}", e)))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// System clock using std::time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}
