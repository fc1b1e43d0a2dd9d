//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path,
//! you get a handler.

use std::collections::HashMap;
use std::sync::Arc;

use http::header::{ALLOW, HeaderValue};
use http::request::Parts;
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::app::App;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;
use crate::state::AppState;

/// The application router.
///
/// Build it once at startup, attach state with [`Router::with_state`], pass
/// the resulting [`App`] to [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or is already registered for
    /// `method`. Routes are fixed at startup, so this is a programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Shorthand for `on(Method::GET, ..)`.
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn with_state(self, state: AppState) -> App {
        App::new(self, state)
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Methods that have a route for `path`, sorted for a stable `Allow` header.
    fn allowed(&self, path: &str) -> Vec<&str> {
        let mut methods: Vec<&str> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.as_str())
            .collect();
        methods.sort_unstable();
        methods
    }

    /// Routes one request: the matching handler's response, `405` when the
    /// path exists under other methods, `404` otherwise.
    pub(crate) async fn route(&self, state: AppState, parts: Parts) -> Response {
        if let Some((handler, params)) = self.lookup(&parts.method, parts.uri.path()) {
            return handler.call(state, Request::new(parts, params)).await;
        }

        let allowed = self.allowed(parts.uri.path());
        if allowed.is_empty() {
            return Response::status(StatusCode::NOT_FOUND);
        }
        match HeaderValue::from_str(&allowed.join(", ")) {
            Ok(allow) => Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .header(ALLOW, allow)
                .no_body(),
            Err(_) => Response::status(StatusCode::METHOD_NOT_ALLOWED),
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
