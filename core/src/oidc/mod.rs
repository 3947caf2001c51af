//! OIDC user claims validation
//!
//! Verifies the signed claims the load balancer forwards in the
//! `x-amzn-oidc-data` header: token decoding, key location, key retrieval and
//! caching, ES256 signature verification, and typed claim access.

mod cache;
mod claims;
mod key_url;
mod keys;
mod signature;
mod token;
mod validate;

pub use cache::KeyCache;
pub use claims::Claims;
pub use key_url::{resolve, ElbKeyLocator, FixedKeyLocator, KeyLocation, KeyLocator};
pub use keys::{parse_public_key_pem, KeyFetcher};
pub use signature::verify_es256;
pub use token::{JsonObject, Token};
pub use validate::{Validator, ValidatorBuilder};
