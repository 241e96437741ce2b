//! The processing path of one request taken from the queue.
//!
//! 1. downloader middleware, request phase
//! 2. `RequestSending`, then the dispatch delay
//! 3. fetch right after the delay; a transport failure becomes a failed
//!    response
//! 4. downloader middleware, response phase
//! 5. response middleware, extraction
//! 6. follow-up requests through the response middleware, then the queue
//! 7. items through the item path
//!
//! The caller holds the request's concurrency slot for the whole path.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::events::{Event, EventKind};
use crate::item::{Item, ParseOutput};
use crate::request::Request;
use crate::response::Response;

use super::context::RunContext;
use super::item_processor::process_item;
use super::middleware_chain;

pub(crate) async fn process_request(context: Arc<RunContext>, request: Request) {
    let plan = Arc::clone(&context.plan);

    let request = match middleware_chain::process_request(plan.downloader_middleware(), request).await {
        Ok(request) => request,
        Err(rejection) => {
            context.request_dropped(rejection).await;
            return;
        }
    };

    context
        .events
        .emit(EventKind::RequestSending, || Event::RequestSending {
            request: request.clone(),
        })
        .await;
    // nothing may be awaited between the dispatch stamp and the fetch
    context.gate.wait_for_dispatch().await;
    context.stats.increment_requests_issued();
    let response = fetch(&context, request).await;
    context.stats.increment_responses_received();
    context
        .events
        .emit(EventKind::ResponseReceived, || Event::ResponseReceived {
            response: response.clone(),
        })
        .await;

    let mut output = ParseOutput::new();
    let outcome =
        middleware_chain::process_response(plan.downloader_middleware(), response, &mut output)
            .await;
    let (mut items, retries) = output.into_parts();
    for request in retries {
        context.schedule(request).await;
    }
    let response = match outcome {
        Ok(response) => response,
        Err(rejection) => {
            let response = context.response_dropped(rejection).await;
            route_items(&context, items, &response).await;
            return;
        }
    };

    let mut output = ParseOutput::new();
    let response = match middleware_chain::extract(plan.response_middleware(), response, &mut output).await {
        Ok(response) => response,
        Err(rejection) => context.response_dropped(rejection).await,
    };
    let (extracted, follow_ups) = output.into_parts();
    items.extend(extracted);

    trace!(
        "Response {} produced {} items and {} follow-up requests",
        response.url,
        items.len(),
        follow_ups.len()
    );
    for request in follow_ups {
        match middleware_chain::filter_request(plan.response_middleware(), request, &response).await {
            Ok(request) => context.schedule(request).await,
            Err(rejection) => context.request_dropped(rejection).await,
        }
    }
    route_items(&context, items, &response).await;
}

async fn fetch(context: &RunContext, request: Request) -> Response {
    let request = Arc::new(request);
    match context.downloader.fetch(Arc::clone(&request)).await {
        Ok(response) => {
            context.stats.increment_requests_succeeded();
            context.stats.add_bytes_downloaded(response.body.len());
            response
        }
        Err(failure) => {
            warn!("Fetching {} failed: {}", request.url, failure);
            context.stats.increment_requests_failed();
            Response::failed(request, failure)
        }
    }
}

async fn route_items(context: &RunContext, items: Vec<Item>, response: &Response) {
    for item in items {
        process_item(context, item, response).await;
    }
}
