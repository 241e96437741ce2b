//! The fetch outcome for a [`Request`].

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use url::Url;

use crate::error::TransportFailure;
use crate::request::Request;

/// What the transport produced for a request.
///
/// A response either carries status, headers and body, or, when the transport
/// failed, the [`TransportFailure`]. Both kinds travel the same response phase
/// so middleware can react to failures.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Bytes,
    request: Arc<Request>,
    failure: Option<TransportFailure>,
}

impl Response {
    pub fn new(
        request: Arc<Request>,
        status: StatusCode,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            url: request.url.clone(),
            status: Some(status),
            headers,
            body: body.into(),
            request,
            failure: None,
        }
    }

    /// A response standing in for a failed fetch.
    pub fn failed(request: Arc<Request>, failure: TransportFailure) -> Self {
        Self {
            url: request.url.clone(),
            status: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            request,
            failure: Some(failure),
        }
    }

    /// Overrides the final url, e.g. after the transport followed redirects.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    /// HTTP status, `None` for failed responses.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn failure(&self) -> Option<&TransportFailure> {
        self.failure.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// `true` when the fetch succeeded with a 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|status| status.is_success())
    }

    /// The request this response was fetched for.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
