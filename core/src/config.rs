//! Protocol constants and defaults

use std::time::Duration;

/// Request header in which the load balancer forwards the signed user claims
pub const OIDC_DATA_HEADER: &str = "x-amzn-oidc-data";

/// Response header carrying the verified email claim
pub const AUTH_EMAIL_HEADER: &str = "x-auth-request-email";

/// The only signing algorithm the load balancer uses
pub const SUPPORTED_ALGORITHM: &str = "ES256";

/// Commercial partition of the signer ARN
pub const PARTITION_AWS: &str = "aws";

/// GovCloud partition of the signer ARN
pub const PARTITION_AWS_US_GOV: &str = "aws-us-gov";

/// Key fetch retry policy (see [`crate::retry::RetryPolicy`])
pub const KEY_FETCH_MIN_DELAY: Duration = Duration::from_millis(500);
pub const KEY_FETCH_MAX_DELAY: Duration = Duration::from_secs(3);
pub const KEY_FETCH_MAX_ATTEMPTS: u32 = 10;
pub const KEY_FETCH_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default per-request validation timeout
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(30);
