//! amzn-oidc-validate-server: validates Application Load Balancer user claims
//!
//! Lightweight HTTP server using hyper. Put it behind a proxy that sends an
//! auth sub-request carrying `x-amzn-oidc-data`; a 200 response carries the
//! verified email in `X-Auth-Request-Email`, anything else is a 403.

use std::sync::Arc;

use clap::Parser;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use tracing::{error, info};

use alb_oidc_core::oidc::{KeyCache, Validator};

mod config;
mod handler;
mod logging;
mod platform;

use config::Config;
use handler::{handle_request, AppState};
use platform::{ReqwestHttpClient, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::init(&config.log_level)?;

    let state = Arc::new(AppState {
        validator: Validator::new(Arc::new(ReqwestHttpClient::new()), KeyCache::new()),
        clock: Box::new(SystemClock),
        timeout: config.timeout,
    });

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, timeout = ?config.timeout, "Listening");

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!(error = %e, "accept failed");
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        };
        let state = state.clone();

        tokio::spawn(async move {
            let io = hyper_util::rt::TokioIo::new(stream);
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, &state).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!(peer = %peer, error = %e, "connection error");
            }
        });
    }
}
