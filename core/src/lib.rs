//! alb-oidc-core: platform-agnostic validation of Application Load Balancer
//! user claims
//!
//! This crate verifies the ES256-signed token an Application Load Balancer
//! attaches to authenticated requests and exposes its claims. It depends only
//! on abstract platform traits (HttpClient, Clock) and never imports a
//! concrete HTTP stack.

pub mod config;
pub mod context;
pub mod error;
pub mod oidc;
pub mod platform;
pub mod retry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
