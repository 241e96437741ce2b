//! # Downloader Module
//!
//! The transport boundary. The engine hands every request that survived the
//! downloader request phase to a [`Downloader`] and treats whatever comes back
//! (a response or a [`TransportFailure`]) as the input of the response phase.
//!
//! Downloaders do not retry; retries are a middleware concern.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use crate::error::TransportFailure;
use crate::middleware::user_agent::DEFAULT_USER_AGENT;
use crate::request::Request;
use crate::response::Response;

#[async_trait]
pub trait Downloader: Send + Sync + 'static {
    /// Performs the fetch for `request`.
    async fn fetch(&self, request: Arc<Request>) -> Result<Response, TransportFailure>;
}

/// A [`Downloader`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestDownloader {
    client: Client,
}

impl ReqwestDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Default for ReqwestDownloader {
    fn default() -> Self {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self::new(client)
    }
}

#[async_trait]
impl Downloader for ReqwestDownloader {
    async fn fetch(&self, request: Arc<Request>) -> Result<Response, TransportFailure> {
        trace!("Fetching {} {}", request.method, request.url);
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::new(request, status, headers, body).with_url(url))
    }
}
