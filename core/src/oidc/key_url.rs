//! Public key location
//!
//! Derives where the signing key can be downloaded from the token's
//! *unverified* header. A forged header can only point verification at a key
//! the forger does not hold, so nothing here needs to be trusted.
//!
//! See <https://docs.aws.amazon.com/elasticloadbalancing/latest/application/listener-authenticate-users.html#user-claims-encoding>

use serde_json::Value;
use url::Url;

use super::token::JsonObject;
use crate::config::{PARTITION_AWS, PARTITION_AWS_US_GOV, SUPPORTED_ALGORITHM};
use crate::error::{Result, ValidationError};

/// Where a signing key is published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLocation {
    pub url: Url,
    /// Signer partition the URL was derived from (informational)
    pub partition: String,
    /// Signer region the URL was derived from (informational)
    pub region: String,
}

/// Maps a token header to the location of its public key
pub trait KeyLocator: Send + Sync {
    fn locate(&self, header: &JsonObject) -> Result<KeyLocation>;
}

/// Check the algorithm, then ask `locator` for the key location.
///
/// The algorithm check never depends on the locator in use.
pub fn resolve(header: &JsonObject, locator: &dyn KeyLocator) -> Result<KeyLocation> {
    let alg = header_string(header, "alg")?;
    if alg != SUPPORTED_ALGORITHM {
        return Err(ValidationError::unsupported_algorithm(alg));
    }
    locator.locate(header)
}

/// Key locations published by Elastic Load Balancing, keyed by the `kid` and
/// the `signer` ARN of the load balancer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElbKeyLocator;

impl KeyLocator for ElbKeyLocator {
    fn locate(&self, header: &JsonObject) -> Result<KeyLocation> {
        let kid = header_string(header, "kid")?;
        let signer = header_string(header, "signer")?;

        let parts: Vec<&str> = signer.split(':').collect();
        if parts.len() < 4 {
            return Err(ValidationError::malformed_header(format!(
                "invalid signer ARN format: {}",
                signer
            )));
        }
        let (partition, region) = (parts[1], parts[3]);

        validate_region(region)?;
        validate_kid(kid)?;

        let url = match partition {
            PARTITION_AWS => format!("https://public-keys.auth.elb.{}.amazonaws.com/{}", region, kid),
            PARTITION_AWS_US_GOV => format!(
                "https://s3-{}.amazonaws.com/aws-elb-public-keys-prod-{}/{}",
                region, region, kid
            ),
            other => return Err(ValidationError::unsupported_partition(other)),
        };

        let url = Url::parse(&url)
            .map_err(|e| ValidationError::malformed_header(format!("invalid key URL {}: {}", url, e)))?;

        Ok(KeyLocation {
            url,
            partition: partition.to_string(),
            region: region.to_string(),
        })
    }
}

/// Always points at one URL. Used for local key mirrors and in tests.
#[derive(Debug, Clone)]
pub struct FixedKeyLocator {
    url: Url,
}

impl FixedKeyLocator {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl KeyLocator for FixedKeyLocator {
    fn locate(&self, _header: &JsonObject) -> Result<KeyLocation> {
        Ok(KeyLocation {
            url: self.url.clone(),
            partition: String::new(),
            region: String::new(),
        })
    }
}

fn header_string<'a>(header: &'a JsonObject, name: &str) -> Result<&'a str> {
    match header.get(name) {
        None => Err(ValidationError::malformed_header(format!("no {} in token header", name))),
        Some(Value::String(v)) => Ok(v),
        Some(_) => Err(ValidationError::malformed_header(format!(
            "no {} string in token header",
            name
        ))),
    }
}

// Region and kid are spliced into a URL; restrict them so header text cannot
// move the host or add path segments.
fn validate_region(region: &str) -> Result<()> {
    if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::malformed_header(format!(
            "invalid region in signer ARN: {:?}",
            region
        )));
    }
    Ok(())
}

fn validate_kid(kid: &str) -> Result<()> {
    if kid.is_empty()
        || !kid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::malformed_header(format!("invalid kid: {:?}", kid)));
    }
    Ok(())
}
