//! Validation endpoint
//!
//! Reads the load balancer's `x-amzn-oidc-data` header, validates it, and
//! answers 200 with the verified email in `X-Auth-Request-Email`, or 403.
//! The kind of failure only appears in the response body and the logs.

use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use tracing::{debug, error};

use alb_oidc_core::config::{AUTH_EMAIL_HEADER, OIDC_DATA_HEADER};
use alb_oidc_core::context::Context;
use alb_oidc_core::error::ValidationError;
use alb_oidc_core::oidc::Validator;
use alb_oidc_core::platform::Clock;

pub type HyperResponse = Response<Full<Bytes>>;

/// Shared application state
pub struct AppState {
    pub validator: Validator,
    pub clock: Box<dyn Clock>,
    pub timeout: Duration,
}

pub async fn handle_request(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<HyperResponse, std::convert::Infallible> {
    Ok(handle_validate(req.headers(), state).await)
}

/// Every path and method is a validation request
pub async fn handle_validate(headers: &HeaderMap, state: &AppState) -> HyperResponse {
    let data = headers
        .get(OIDC_DATA_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let ctx = Context::with_timeout(state.timeout);
    let result = match state.validator.validate_with_context(&ctx, data).await {
        Ok(claims) => claims.valid(state.clock.as_ref()).map(|()| claims),
        Err(e) => Err(e),
    };

    match result {
        Ok(claims) => {
            debug!(email = %claims.email(), "validated email");
            ok_response(claims.email())
        }
        Err(e) => {
            error!(error = %e, kind = e.error_key(), data = %data, "validation failed");
            error_response(&e)
        }
    }
}

fn ok_response(email: &str) -> HyperResponse {
    let mut response = text_response(StatusCode::OK, "OK\n".to_string());
    // an email that is not a legal header value is sent empty
    let value = HeaderValue::from_str(email).unwrap_or_else(|_| HeaderValue::from_static(""));
    response.headers_mut().insert(AUTH_EMAIL_HEADER, value);
    response
}

fn error_response(err: &ValidationError) -> HyperResponse {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::FORBIDDEN);
    text_response(status, format!("validation error {}\n", err))
}

fn text_response(status: StatusCode, body: String) -> HyperResponse {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}
