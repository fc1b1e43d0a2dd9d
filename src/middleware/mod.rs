//! Middleware layer.
//!
//! Cross-cutting concerns applied to every request, around the router:
//!
//! - [`trace`] — per-request span with method and path, status and latency
//!   logged on completion
//! - [`ServerHeader`] — stamps the `Server` response header

use std::future::Future;
use std::time::Instant;

use http::header::{HeaderValue, SERVER};
use http::request::Parts;
use tracing::{Instrument, Span, debug, debug_span, warn};

use crate::response::Response;

/// The span a request runs in. Fields are recorded here, so `parts` can be
/// handed on to the router afterwards.
pub fn request_span(parts: &Parts) -> Span {
    debug_span!("request", method = %parts.method, path = %parts.uri.path())
}

/// Runs `next` inside `span` and logs the outcome: server errors at
/// `warn`, everything else at `debug`.
pub async fn trace<F>(span: Span, next: F) -> Response
where
    F: Future<Output = Response>,
{
    async move {
        let started = Instant::now();
        let res = next.await;
        let status = res.status_code().as_u16();
        let latency_us = started.elapsed().as_micros() as u64;
        if res.status_code().is_server_error() {
            warn!(status, latency_us, "request failed");
        } else {
            debug!(status, latency_us, "request finished");
        }
        res
    }
    .instrument(span)
    .await
}

/// Stamps a fixed `Server` header on responses that do not carry one.
#[derive(Clone, Debug)]
pub struct ServerHeader(HeaderValue);

impl ServerHeader {
    /// Falls back to `worldbench` if `name` is not a valid header value.
    pub fn new(name: &str) -> Self {
        match HeaderValue::from_str(name) {
            Ok(value) => Self(value),
            Err(_) => {
                warn!(name, "invalid server name, using default");
                Self::default()
            }
        }
    }

    pub fn apply(&self, res: &mut Response) {
        res.default_header(SERVER, self.0.clone());
    }
}

impl Default for ServerHeader {
    fn default() -> Self {
        Self(HeaderValue::from_static("worldbench"))
    }
}
