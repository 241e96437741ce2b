//! Ordered traversal of the middleware and item processor chains.
//!
//! Every chain is walked strictly in declaration order, threading the payload
//! from one link to the next. The first link that drops the payload, or fails,
//! ends the walk; the returned [`Rejection`] carries the payload as it was
//! handed to that link. A link that panics counts as a failed link.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::{error, trace};

use crate::error::SpiderError;
use crate::item::{Item, Outcome, ParseOutput};
use crate::middleware::{DownloaderMiddlewareAdapter, ResponseMiddlewareAdapter};
use crate::pipeline::ItemProcessor;
use crate::request::Request;
use crate::resolver::ResolvedUnit;
use crate::response::Response;

/// Why a chain did not hand its payload on.
#[derive(Debug)]
pub(crate) enum Rejection<T> {
    Dropped {
        stage: String,
        payload: T,
        reason: String,
    },
    Failed {
        payload: T,
        error: SpiderError,
    },
}

impl<T> Rejection<T> {
    fn from_outcome(stage: &str, payload: T, result: Result<String, SpiderError>) -> Self {
        match result {
            Ok(reason) => Rejection::Dropped {
                stage: stage.to_string(),
                payload,
                reason,
            },
            Err(error) => Rejection::Failed {
                payload,
                error: SpiderError::stage(stage, error),
            },
        }
    }

    pub(crate) fn into_payload(self) -> T {
        match self {
            Rejection::Dropped { payload, .. } | Rejection::Failed { payload, .. } => payload,
        }
    }

    pub(crate) fn reason(&self) -> String {
        match self {
            Rejection::Dropped { stage, reason, .. } => format!("{stage}: {reason}"),
            Rejection::Failed { error, .. } => error.to_string(),
        }
    }

    pub(crate) fn is_failure(&self) -> bool {
        matches!(self, Rejection::Failed { .. })
    }
}

pub(crate) type ChainResult<T> = Result<T, Rejection<T>>;

/// Splits a stage result into the payload to continue with, or the rejection.
fn step<T: Clone>(
    stage: &str,
    before: T,
    result: Result<Outcome<T>, SpiderError>,
) -> ChainResult<T> {
    match result {
        Ok(Outcome::Kept(next)) => Ok(next),
        Ok(Outcome::Dropped(reason)) => Err(Rejection::from_outcome(stage, before, Ok(reason))),
        Err(error) => Err(Rejection::from_outcome(stage, before, Err(error))),
    }
}

/// Runs one link, turning a panic into an error of that link.
async fn guarded<T, F>(stage: &str, call: F) -> Result<Outcome<T>, SpiderError>
where
    F: Future<Output = Result<Outcome<T>, SpiderError>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(_) => {
            error!("'{}' panicked", stage);
            Err(SpiderError::GeneralError("panicked".to_string()))
        }
    }
}

/// Downloader middleware, request phase.
pub(crate) async fn process_request(
    chain: &[DownloaderMiddlewareAdapter],
    request: Request,
) -> ChainResult<Request> {
    let mut current = request;
    for middleware in chain {
        trace!("Request {} -> downloader middleware '{}'", current.url, middleware.name());
        let before = current.clone();
        let result = guarded(middleware.name(), middleware.handle_request(current)).await;
        current = step(middleware.name(), before, result)?;
    }
    Ok(current)
}

/// Downloader middleware, response phase. Same order as the request phase.
pub(crate) async fn process_response(
    chain: &[DownloaderMiddlewareAdapter],
    response: Response,
    output: &mut ParseOutput,
) -> ChainResult<Response> {
    let mut current = response;
    for middleware in chain {
        trace!("Response {} -> downloader middleware '{}'", current.url, middleware.name());
        let before = current.clone();
        let result = guarded(middleware.name(), middleware.handle_response(current, output)).await;
        current = step(middleware.name(), before, result)?;
    }
    Ok(current)
}

/// Response middleware, extraction phase.
pub(crate) async fn extract(
    chain: &[ResponseMiddlewareAdapter],
    response: Response,
    output: &mut ParseOutput,
) -> ChainResult<Response> {
    let mut current = response;
    for middleware in chain {
        trace!("Response {} -> response middleware '{}'", current.url, middleware.name());
        let before = current.clone();
        let result = guarded(middleware.name(), middleware.handle_response(current, output)).await;
        current = step(middleware.name(), before, result)?;
    }
    Ok(current)
}

/// Response middleware filtering of a follow-up request.
pub(crate) async fn filter_request(
    chain: &[ResponseMiddlewareAdapter],
    request: Request,
    response: &Response,
) -> ChainResult<Request> {
    let mut current = request;
    for middleware in chain {
        let before = current.clone();
        let result = guarded(middleware.name(), middleware.handle_request(current, response)).await;
        current = step(middleware.name(), before, result)?;
    }
    Ok(current)
}

/// Response middleware filtering of an extracted item.
pub(crate) async fn filter_item(
    chain: &[ResponseMiddlewareAdapter],
    item: Item,
    response: &Response,
) -> ChainResult<Item> {
    let mut current = item;
    for middleware in chain {
        let before = current.clone();
        let result = guarded(middleware.name(), middleware.handle_item(current, response)).await;
        current = step(middleware.name(), before, result)?;
    }
    Ok(current)
}

/// The item processor chain.
pub(crate) async fn process_item(
    processors: &[ResolvedUnit<dyn ItemProcessor>],
    item: Item,
) -> ChainResult<Item> {
    let mut current = item;
    for (index, processor) in processors.iter().enumerate() {
        trace!(
            "Processing item through '{}' ({} of {})",
            processor.name,
            index + 1,
            processors.len()
        );
        let before = current.clone();
        let result = guarded(&processor.name, processor.unit.process_item(current)).await;
        current = step(&processor.name, before, result)?;
    }
    Ok(current)
}
