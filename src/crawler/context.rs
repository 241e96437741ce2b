//! State shared by the dispatcher and every in-flight request of a run.

use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, error, warn};

use crate::concurrency::DispatchGate;
use crate::downloader::Downloader;
use crate::events::{Event, EventKind};
use crate::extensions::EventDispatcher;
use crate::item::Item;
use crate::plan::RunPlan;
use crate::request::Request;
use crate::response::Response;
use crate::scheduler::Scheduler;
use crate::state::{RunPhase, RunState};
use crate::stats::StatCollector;

use super::middleware_chain::Rejection;

pub(crate) struct RunContext {
    pub(crate) plan: Arc<RunPlan>,
    pub(crate) downloader: Arc<dyn Downloader>,
    pub(crate) scheduler: Scheduler,
    pub(crate) stats: StatCollector,
    pub(crate) events: EventDispatcher,
    pub(crate) gate: DispatchGate,
    pub(crate) state: Arc<RunState>,
}

impl RunContext {
    /// Puts `request` on the queue, which makes the run `Running` again.
    pub(crate) async fn schedule(&self, request: Request) {
        self.events
            .emit(EventKind::RequestScheduled, || Event::RequestScheduled {
                request: request.clone(),
            })
            .await;
        // before the enqueue, so the dispatcher's Draining for this request wins
        self.state.set_phase(RunPhase::Running);
        if self.scheduler.enqueue_request(request) {
            self.stats.increment_requests_scheduled();
        }
    }

    pub(crate) async fn request_dropped(&self, rejection: Rejection<Request>) {
        self.record_rejection("request", &rejection);
        self.stats.increment_requests_dropped();
        let reason = rejection.reason();
        self.events
            .emit(EventKind::RequestDropped, move || Event::RequestDropped {
                request: rejection.into_payload(),
                reason,
            })
            .await;
    }

    /// Reports the dropped response and hands it back, so outputs emitted
    /// before the drop can still be routed.
    pub(crate) async fn response_dropped(&self, rejection: Rejection<Response>) -> Response {
        self.record_rejection("response", &rejection);
        self.stats.increment_responses_dropped();
        let reason = rejection.reason();
        let response = rejection.into_payload();
        self.events
            .emit(EventKind::ResponseDropped, || Event::ResponseDropped {
                response: response.clone(),
                reason,
            })
            .await;
        response
    }

    pub(crate) async fn item_dropped(&self, rejection: Rejection<Item>) {
        self.record_rejection("item", &rejection);
        self.stats.increment_items_dropped();
        let reason = rejection.reason();
        self.events
            .emit(EventKind::ItemDropped, move || Event::ItemDropped {
                item: rejection.into_payload(),
                reason,
            })
            .await;
    }

    fn record_rejection<T>(&self, what: &str, rejection: &Rejection<T>) {
        if rejection.is_failure() {
            self.stats.increment_stage_errors();
            warn!("Dropping {} after a stage error: {}", what, rejection.reason());
        } else {
            debug!("Dropped {}: {}", what, rejection.reason());
        }
    }

    /// Accounts for a request task that ended.
    pub(crate) fn task_finished(&self, result: Result<(), JoinError>) {
        if let Err(e) = result {
            self.stats.increment_stage_errors();
            if e.is_panic() {
                error!("A request pipeline panicked, its request was abandoned: {}", e);
            } else {
                error!("A request pipeline was aborted: {}", e);
            }
        }
    }
}
