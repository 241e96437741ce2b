//! # Middleware
//!
//! Capability traits for the two middleware chains and the built-in units.
//!
//! Downloader middleware sits around the transport: it sees every request
//! before it is fetched and every response (including failed ones) right after.
//! Response middleware runs after that; it is where items are extracted and
//! follow-up requests are emitted, and it gets to filter both before they move
//! on.
//!
//! A single type may implement both traits. The adapter a unit is wrapped in
//! decides which role applies in which chain.

mod adapter;
pub mod depth;
pub mod dedup;
pub mod retry;
pub mod user_agent;

pub use adapter::{DownloaderMiddlewareAdapter, ResponseMiddlewareAdapter};

use async_trait::async_trait;

use crate::configuration::Configurable;
use crate::error::SpiderError;
use crate::item::{Item, Outcome, ParseOutput};
use crate::request::Request;
use crate::response::Response;

#[async_trait]
pub trait DownloaderMiddleware: Configurable + Send + Sync + 'static {
    /// Called before `request` is fetched. Return a replacement request or
    /// drop it; a dropped request never reaches the transport.
    async fn handle_request(&self, request: Request) -> Result<Outcome<Request>, SpiderError> {
        Ok(Outcome::Kept(request))
    }

    /// Called with the fetch result. Requests added to `output` are scheduled
    /// as new queue entries even if the response is dropped.
    async fn handle_response(
        &self,
        response: Response,
        _output: &mut ParseOutput,
    ) -> Result<Outcome<Response>, SpiderError> {
        Ok(Outcome::Kept(response))
    }
}

#[async_trait]
pub trait ResponseMiddleware: Configurable + Send + Sync + 'static {
    /// Extracts items and follow-up requests from `response` into `output`.
    async fn handle_response(
        &self,
        response: Response,
        _output: &mut ParseOutput,
    ) -> Result<Outcome<Response>, SpiderError> {
        Ok(Outcome::Kept(response))
    }

    /// Filters an item extracted from `response` before it reaches the item
    /// processors.
    async fn handle_item(
        &self,
        item: Item,
        _response: &Response,
    ) -> Result<Outcome<Item>, SpiderError> {
        Ok(Outcome::Kept(item))
    }

    /// Filters a follow-up request emitted while processing `response`.
    async fn handle_request(
        &self,
        request: Request,
        _response: &Response,
    ) -> Result<Outcome<Request>, SpiderError> {
        Ok(Outcome::Kept(request))
    }
}
