//! Token validation
//!
//! Decodes the token, locates and fetches the signer's public key, and
//! verifies the signature. Expiry is left to the caller (see
//! [`Claims::valid`]) so expired tokens with a good signature can still be
//! inspected.

use std::sync::Arc;

use tracing::debug;

use super::cache::KeyCache;
use super::claims::Claims;
use super::key_url::{resolve, ElbKeyLocator, KeyLocator};
use super::keys::KeyFetcher;
use super::signature::verify_es256;
use super::token::Token;
use crate::context::Context;
use crate::error::{Result, ValidationError};
use crate::platform::HttpClient;
use crate::retry::RetryPolicy;

pub struct Validator {
    keys: KeyFetcher,
    locator: Arc<dyn KeyLocator>,
}

impl Validator {
    /// Validator using the load balancer key endpoints and the default
    /// retry policy
    pub fn new(http: Arc<dyn HttpClient>, cache: KeyCache) -> Self {
        Self::builder(http, cache).build()
    }

    pub fn builder(http: Arc<dyn HttpClient>, cache: KeyCache) -> ValidatorBuilder {
        ValidatorBuilder {
            http,
            cache,
            locator: Arc::new(ElbKeyLocator),
            retry: RetryPolicy::default(),
        }
    }

    pub fn cache(&self) -> &KeyCache {
        self.keys.cache()
    }

    /// Validate with no deadline
    pub async fn validate(&self, raw: &str) -> Result<Claims> {
        self.validate_with_context(&Context::background(), raw).await
    }

    /// Verify `raw` and return its claims.
    ///
    /// Only the key download waits on `ctx`; every other step is local.
    pub async fn validate_with_context(&self, ctx: &Context, raw: &str) -> Result<Claims> {
        let token = Token::decode(raw)?;

        let location = resolve(token.header(), self.locator.as_ref())?;
        let key = self.keys.get_or_fetch(ctx, location.url.as_str()).await?;

        if !verify_es256(token.signing_input(), token.signature(), &key) {
            return Err(ValidationError::InvalidSignature);
        }
        debug!(url = %location.url, "token signature verified");

        Ok(Claims::new(token.into_payload()))
    }
}

pub struct ValidatorBuilder {
    http: Arc<dyn HttpClient>,
    cache: KeyCache,
    locator: Arc<dyn KeyLocator>,
    retry: RetryPolicy,
}

impl ValidatorBuilder {
    pub fn locator(mut self, locator: impl KeyLocator + 'static) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Validator {
        Validator {
            keys: KeyFetcher::new(self.http, self.cache, self.retry),
            locator: self.locator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::oidc::key_url::FixedKeyLocator;
    use crate::test_support::{
        default_payload, elb_header, generate_key_pair, sign_token, MockClock, MockHttp,
    };
    use serde_json::json;
    use std::time::Duration;
    use url::Url;

    const SIGNER: &str =
        "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/test/d74f8c34849f8790";
    const KID: &str = "cca216b2-6fd4-4953-92d4-ec232ffb9891";
    const KEY_URL: &str =
        "https://public-keys.auth.elb.us-east-1.amazonaws.com/cca216b2-6fd4-4953-92d4-ec232ffb9891";

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(5), Duration::from_millis(20), 3)
    }

    #[tokio::test]
    async fn test_validate_signed_token() {
        let (signing_key, key) = generate_key_pair();
        let http = Arc::new(MockHttp::serving_key(KEY_URL, &key));
        let validator = Validator::new(http.clone(), KeyCache::new());

        let token = sign_token(&elb_header(SIGNER, KID), &default_payload(2000), &signing_key);
        let claims = validator.validate(&token).await.unwrap();

        assert_eq!(claims.email(), "foo@example.com");
        assert!(claims.email_verified());
        assert_eq!(claims.updated_at(), 1593592790.0);
        assert!(claims.valid(&MockClock(1999)).is_ok());
        assert_eq!(http.requested_urls(), vec![KEY_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_govcloud_signer() {
        let url = "https://s3-us-gov-east-1.amazonaws.com/aws-elb-public-keys-prod-us-gov-east-1/d39846c3-18d4-4c5e-8148-27a63a4fa6d8";
        let (signing_key, key) = generate_key_pair();
        let http = Arc::new(MockHttp::serving_key(url, &key));
        let validator = Validator::new(http.clone(), KeyCache::new());

        let header = elb_header(
            "arn:aws-us-gov:elasticloadbalancing:us-gov-east-1:123456789012:loadbalancer/app/test/d74f8c34849f8790",
            "d39846c3-18d4-4c5e-8148-27a63a4fa6d8",
        );
        let token = sign_token(&header, &default_payload(2000), &signing_key);
        assert!(validator.validate(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_validation_hits_cache() {
        let (signing_key, key) = generate_key_pair();
        let http = Arc::new(MockHttp::serving_key(KEY_URL, &key));
        let validator = Validator::new(http.clone(), KeyCache::new());

        let first = sign_token(&elb_header(SIGNER, KID), &default_payload(2000), &signing_key);
        let second = sign_token(&elb_header(SIGNER, KID), &default_payload(3000), &signing_key);
        validator.validate(&first).await.unwrap();
        validator.validate(&second).await.unwrap();

        assert_eq!(http.request_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupted_signature() {
        let (signing_key, key) = generate_key_pair();
        let http = Arc::new(MockHttp::serving_key(KEY_URL, &key));
        let validator = Validator::new(http, KeyCache::new());
        let token = sign_token(&elb_header(SIGNER, KID), &default_payload(2000), &signing_key);

        let truncated = &token[..token.len() - 10];
        assert!(matches!(
            validator.validate(truncated).await,
            Err(ValidationError::InvalidSignature)
        ));

        let (other_key, _) = generate_key_pair();
        let forged = sign_token(&elb_header(SIGNER, KID), &default_payload(2000), &other_key);
        assert!(matches!(
            validator.validate(&forged).await,
            Err(ValidationError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_tampered_payload() {
        let (signing_key, key) = generate_key_pair();
        let http = Arc::new(MockHttp::serving_key(KEY_URL, &key));
        let validator = Validator::new(http, KeyCache::new());

        let token = sign_token(&elb_header(SIGNER, KID), &default_payload(2000), &signing_key);
        let other = sign_token(
            &elb_header(SIGNER, KID),
            &json!({ "email": "admin@example.com", "exp": 2000 }),
            &signing_key,
        );

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(
            validator.validate(&spliced).await,
            Err(ValidationError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_unsupported_algorithm_makes_no_request() {
        let (signing_key, key) = generate_key_pair();
        let http = Arc::new(MockHttp::serving_key(KEY_URL, &key));
        let validator = Validator::new(http.clone(), KeyCache::new());

        let header = json!({ "alg": "RS256", "kid": KID, "signer": SIGNER });
        let token = sign_token(&header, &default_payload(2000), &signing_key);

        assert!(matches!(
            validator.validate(&token).await,
            Err(ValidationError::UnsupportedAlgorithm { .. })
        ));
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_still_validates() {
        let (signing_key, key) = generate_key_pair();
        let http = Arc::new(MockHttp::serving_key(KEY_URL, &key));
        let validator = Validator::new(http, KeyCache::new());

        let token = sign_token(&elb_header(SIGNER, KID), &default_payload(1000), &signing_key);
        let claims = validator.validate(&token).await.unwrap();

        assert!(claims.is_expired_at(1000));
        assert!(matches!(claims.valid(&MockClock(5000)), Err(ValidationError::Expired)));
    }

    #[tokio::test]
    async fn test_malformed_token() {
        let validator = Validator::new(Arc::new(MockHttp::new(vec![])), KeyCache::new());
        assert!(matches!(
            validator.validate("not-a-token").await,
            Err(ValidationError::MalformedToken { .. })
        ));
    }

    #[tokio::test]
    async fn test_key_fetch_failure() {
        let (signing_key, _) = generate_key_pair();
        let http = Arc::new(MockHttp::new(vec![(KEY_URL.to_string(), 404, Vec::new())]));
        let validator = Validator::builder(http.clone(), KeyCache::new())
            .retry_policy(fast_retry())
            .build();

        let token = sign_token(&elb_header(SIGNER, KID), &default_payload(2000), &signing_key);
        match validator.validate(&token).await {
            Err(ValidationError::KeyFetchFailed { attempts, source, .. }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, FetchError::Status(404)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(http.request_count(), 3);
    }

    #[tokio::test]
    async fn test_custom_locator() {
        let (signing_key, key) = generate_key_pair();
        let mirror = "http://127.0.0.1:9000/keys/current";
        let http = Arc::new(MockHttp::serving_key(mirror, &key));
        let validator = Validator::builder(http.clone(), KeyCache::new())
            .locator(FixedKeyLocator::new(Url::parse(mirror).unwrap()))
            .build();

        let header = json!({ "alg": "ES256" });
        let token = sign_token(&header, &default_payload(2000), &signing_key);
        assert!(validator.validate(&token).await.is_ok());
        assert_eq!(http.requested_urls(), vec![mirror.to_string()]);
    }

    #[tokio::test]
    async fn test_shared_cache_between_validators() {
        let (signing_key, key) = generate_key_pair();
        let http = Arc::new(MockHttp::serving_key(KEY_URL, &key));
        let cache = KeyCache::new();
        let a = Validator::new(http.clone(), cache.clone());
        let b = Validator::new(http.clone(), cache);

        let token = sign_token(&elb_header(SIGNER, KID), &default_payload(2000), &signing_key);
        a.validate(&token).await.unwrap();
        b.validate(&token).await.unwrap();

        assert!(a.cache().contains(KEY_URL));
        assert_eq!(http.request_count(), 1);
    }
}
