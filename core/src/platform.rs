//! Platform abstraction traits
//!
//! These traits define the boundary between the validation engine and the
//! environment it runs in (native HTTP client, system clock, test mocks).

use async_trait::async_trait;

use crate::error::FetchError;

/// HTTP client for outbound requests (public key retrieval)
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError>;
}

/// HTTP response from an outbound request
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse body as UTF-8 string
    pub fn text(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

/// Clock for current time (enables testing with deterministic timestamps)
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}
