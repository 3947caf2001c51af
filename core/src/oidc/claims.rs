//! Verified token claims
//!
//! The payload is kept as decoded JSON. Accessors return the type's zero
//! value when a claim is missing or has an unexpected JSON type: optional
//! claims are routinely absent, so neither case is an error.
//!
//! Standard claims per <https://openid.net/specs/openid-connect-core-1_0.html#StandardClaims>

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::token::JsonObject;
use crate::error::{Result, ValidationError};
use crate::platform::Clock;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(JsonObject);

macro_rules! string_claims {
    ($($(#[$doc:meta])* $method:ident => $name:literal,)*) => {
        $(
            $(#[$doc])*
            pub fn $method(&self) -> &str {
                self.string($name)
            }
        )*
    };
}

impl Claims {
    pub fn new(payload: JsonObject) -> Self {
        Self(payload)
    }

    /// Raw claim value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String claim, or `""`
    pub fn string(&self, name: &str) -> &str {
        match self.0.get(name) {
            Some(Value::String(s)) => s,
            _ => "",
        }
    }

    /// Boolean claim, or `false`
    pub fn boolean(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(Value::Bool(true)))
    }

    /// Numeric claim as a real number, or `0.0`
    pub fn number(&self, name: &str) -> f64 {
        match self.0.get(name) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Integral numeric claim, or `0`. Fractional numbers count as a type
    /// mismatch.
    pub fn integer(&self, name: &str) -> i64 {
        match self.0.get(name) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            _ => 0,
        }
    }

    string_claims! {
        /// Issuer
        iss => "iss",
        /// Subject
        sub => "sub",
        name => "name",
        given_name => "given_name",
        family_name => "family_name",
        middle_name => "middle_name",
        nickname => "nickname",
        preferred_username => "preferred_username",
        profile => "profile",
        picture => "picture",
        website => "website",
        email => "email",
        gender => "gender",
        birthdate => "birthdate",
        /// Time zone, e.g. `Europe/Paris`
        zoneinfo => "zoneinfo",
        locale => "locale",
        phone_number => "phone_number",
    }

    pub fn email_verified(&self) -> bool {
        self.boolean("email_verified")
    }

    pub fn phone_number_verified(&self) -> bool {
        self.boolean("phone_number_verified")
    }

    /// Last profile update, seconds since the epoch
    pub fn updated_at(&self) -> f64 {
        self.number("updated_at")
    }

    /// Expiry in whole seconds since the epoch
    pub fn exp(&self) -> i64 {
        self.integer("exp")
    }

    /// True unless `now_secs` is strictly before the expiry instant. A token
    /// without a usable `exp` claim is expired.
    pub fn is_expired_at(&self, now_secs: u64) -> bool {
        let now = i64::try_from(now_secs).unwrap_or(i64::MAX);
        now >= self.exp()
    }

    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        self.is_expired_at(clock.now_secs())
    }

    /// `Err(Expired)` once the token has expired
    pub fn valid(&self, clock: &dyn Clock) -> Result<()> {
        if self.is_expired(clock) {
            return Err(ValidationError::Expired);
        }
        Ok(())
    }

    pub fn as_map(&self) -> &JsonObject {
        &self.0
    }
}

impl From<JsonObject> for Claims {
    fn from(payload: JsonObject) -> Self {
        Self(payload)
    }
}
