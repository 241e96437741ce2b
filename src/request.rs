//! The crawl request type.

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::SpiderError;
use crate::middleware::dedup::DONT_FILTER;
use crate::middleware::retry::RETRY_COUNT;

/// A request to be fetched by the engine.
///
/// Besides the HTTP parts a request carries a metadata bag. Middleware uses it
/// to pass context from a response to the follow-up requests it spawns
/// (crawl depth, retry counters and the like).
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    meta: HashMap<String, Value>,
}

impl Request {
    /// Creates a `GET` request for `url`.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            meta: HashMap::new(),
        }
    }

    /// Parses `url` and creates a `GET` request for it.
    pub fn get(url: &str) -> Result<Self, SpiderError> {
        Ok(Self::new(Url::parse(url)?))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.meta.insert(key.into(), value.into());
    }

    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    pub fn meta_u64(&self, key: &str) -> Option<u64> {
        self.meta.get(key).and_then(Value::as_u64)
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.meta
    }

    /// A follow-up request for `url` that inherits this request's metadata,
    /// minus the keys that only apply to this fetch attempt.
    pub fn follow(&self, url: Url) -> Self {
        let mut meta = self.meta.clone();
        meta.remove(RETRY_COUNT);
        meta.remove(DONT_FILTER);
        Self {
            meta,
            ..Self::new(url)
        }
    }

    /// Canonical identity of the request: method and url without fragment.
    pub fn fingerprint(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {}", self.method, url)
    }
}
