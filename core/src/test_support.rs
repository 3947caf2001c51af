//! Mock implementations of platform traits and token helpers for testing

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::{EncodePublicKey, LineEnding};
use p256::PublicKey;
use rand::rngs::OsRng;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::FetchError;
use crate::platform::{Clock, HttpClient, HttpResponse};

/// Mock HTTP client with pre-configured responses that records every request
pub struct MockHttp {
    responses: Vec<(String, u16, Vec<u8>)>,
    transient_failures: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl MockHttp {
    /// Responses are `(url pattern, status, body)`; the first pattern
    /// contained in the requested URL wins.
    pub fn new(responses: Vec<(String, u16, Vec<u8>)>) -> Self {
        Self {
            responses,
            transient_failures: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `key` as PEM at `url`
    pub fn serving_key(url: &str, key: &PublicKey) -> Self {
        Self::new(vec![(url.to_string(), 200, public_key_pem(key).into_bytes())])
    }

    /// Fail the first `count` requests with a transport error
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        let failing = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(FetchError::transport("connection reset by mock"));
        }

        for (pattern, status, body) in &self.responses {
            if url.contains(pattern.as_str()) {
                return Ok(HttpResponse {
                    status: *status,
                    body: body.clone(),
                });
            }
        }
        Err(FetchError::transport(format!("no mock response for GET {}", url)))
    }
}

/// Mock clock with a fixed timestamp
pub struct MockClock(pub u64);

impl Clock for MockClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}

/// Fresh P-256 key pair
pub fn generate_key_pair() -> (SigningKey, PublicKey) {
    let signing_key = SigningKey::random(&mut OsRng);
    let public_key = PublicKey::from(signing_key.verifying_key());
    (signing_key, public_key)
}

/// SubjectPublicKeyInfo PEM, as published by the load balancer key endpoints
pub fn public_key_pem(key: &PublicKey) -> String {
    key.to_public_key_pem(LineEnding::LF).unwrap()
}

/// Token header as written by the load balancer
pub fn elb_header(signer: &str, kid: &str) -> Value {
    json!({
        "typ": "JWT",
        "kid": kid,
        "alg": "ES256",
        "iss": "https://idp.example.com",
        "client": "client-id",
        "signer": signer,
        "exp": 1593592790,
    })
}

/// Claims used throughout the tests, expiring at `exp`
pub fn default_payload(exp: i64) -> Value {
    json!({
        "sub": "0f7c3c4a-7e23-4b0e-9d1f-9a1c0c7d1a2b",
        "foo": "bar",
        "email": "foo@example.com",
        "email_verified": true,
        "updated_at": 1593592790,
        "exp": exp,
        "iss": "https://idp.example.com",
    })
}

/// Encode and sign a compact token with ES256
pub fn sign_token(header: &Value, payload: &Value, key: &SigningKey) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).unwrap());
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    let signing_input = format!("{}.{}", header, payload);

    let signature: Signature = key.sign(signing_input.as_bytes());
    format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature.to_bytes()))
}
