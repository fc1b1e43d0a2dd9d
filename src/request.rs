//! Incoming HTTP request type.

use std::collections::HashMap;

use http::request::Parts;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request.
///
/// Every endpoint is a `GET` without a body, so only the head is kept.
pub struct Request {
    parts: Parts,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(parts: Parts, params: HashMap<String, String>) -> Self {
        Self { parts, params }
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }

    /// Header lookup. Header names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name)?.to_str().ok()
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/worlds/{id}`, `req.param("id")` on `/worlds/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the first percent-decoded value of query parameter `key`.
    ///
    /// `?queries=5&queries=9` yields `Some("5")`; `?queries` yields `Some("")`.
    pub fn query(&self, key: &str) -> Option<String> {
        let raw = self.parts.uri.query()?;
        url::form_urlencoded::parse(raw.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}
