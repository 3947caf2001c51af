//! Compact token decoding
//!
//! Splits a `header.payload.signature` token into its parts without trusting
//! any of them. Nothing here is cryptographic.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{Result, ValidationError};

/// JSON object decoded from a token segment
pub type JsonObject = Map<String, Value>;

/// A decoded but unverified compact token
#[derive(Debug, Clone)]
pub struct Token {
    raw: String,
    signed_len: usize,
    header: JsonObject,
    payload: JsonObject,
    signature: Vec<u8>,
}

impl Token {
    /// Decode a compact token.
    ///
    /// Fails with `MalformedToken` unless the input has exactly three
    /// dot-separated base64url segments whose first two are JSON objects.
    pub fn decode(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 3 {
            return Err(ValidationError::malformed_token(format!(
                "expected 3 segments, got {}",
                parts.len()
            )));
        }

        let header = decode_object(parts[0], "header")?;
        let payload = decode_object(parts[1], "payload")?;
        let signature = base64_url_decode(parts[2])
            .map_err(|e| ValidationError::malformed_token(format!("invalid signature encoding: {}", e)))?;

        Ok(Self {
            raw: raw.to_string(),
            signed_len: parts[0].len() + 1 + parts[1].len(),
            header,
            payload,
            signature,
        })
    }

    /// Header fields, untrusted until the signature is verified
    pub fn header(&self) -> &JsonObject {
        &self.header
    }

    pub fn payload(&self) -> &JsonObject {
        &self.payload
    }

    pub fn into_payload(self) -> JsonObject {
        self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The encoded `header.payload` text exactly as transmitted
    pub fn signing_input(&self) -> &[u8] {
        &self.raw.as_bytes()[..self.signed_len]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn decode_object(segment: &str, name: &str) -> Result<JsonObject> {
    let bytes = base64_url_decode(segment)
        .map_err(|e| ValidationError::malformed_token(format!("invalid {} encoding: {}", name, e)))?;
    serde_json::from_slice::<JsonObject>(&bytes)
        .map_err(|e| ValidationError::malformed_token(format!("{} is not a JSON object: {}", name, e)))
}

/// Base64 URL decode, with or without padding
fn base64_url_decode(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(input).or_else(|_| URL_SAFE.decode(input))
}
