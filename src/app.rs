//! Router + state + middleware: the thing the server runs.

use std::sync::Arc;

use http::request::Parts;

use crate::middleware::{self, ServerHeader};
use crate::response::Response;
use crate::router::Router;
use crate::state::AppState;

/// A router bound to its [`AppState`].
///
/// Cheap to clone; every connection task holds one.
#[derive(Clone)]
pub struct App {
    router: Arc<Router>,
    state: AppState,
    server_header: ServerHeader,
}

impl App {
    pub(crate) fn new(router: Router, state: AppState) -> Self {
        Self { router: Arc::new(router), state, server_header: ServerHeader::default() }
    }

    /// Value of the `Server` header on every response (default `worldbench`).
    pub fn server_name(mut self, name: &str) -> Self {
        self.server_header = ServerHeader::new(name);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Core hot path: one request head in, one response out.
    ///
    /// Never fails: routing misses and handler failures are already
    /// responses (404, 405, 500) by the time they get here.
    pub async fn handle(&self, parts: Parts) -> Response {
        let span = middleware::request_span(&parts);
        let mut res = middleware::trace(span, self.router.route(self.state.clone(), parts)).await;
        self.server_header.apply(&mut res);
        res
    }
}
