//! The core Crawler implementation.
//!
//! This module defines the `Crawler` struct, which executes a [`RunPlan`]. A
//! single dispatcher loop takes requests from the scheduler as concurrency
//! slots become available and spawns one task per request. Each task walks the
//! request through the whole pipeline, from downloader middleware to the item
//! processors, and may put follow-up requests back on the queue.
//!
//! The run ends once the queue is empty and no request task is alive, or after
//! cancellation once in-flight tasks have drained. Item processors are closed,
//! `RunFinished` is emitted and the [`RunResult`] is returned.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::concurrency::DispatchGate;
use crate::downloader::Downloader;
use crate::events::{Event, EventKind, RunInfo};
use crate::extensions::EventDispatcher;
use crate::plan::RunPlan;
use crate::scheduler::Scheduler;
use crate::state::{RunPhase, RunState};
use crate::stats::{RunResult, StatCollector};

use super::context::RunContext;
use super::request_handler::process_request;

/// Executes one [`RunPlan`].
pub struct Crawler {
    context: Arc<RunContext>,
    cancellation: CancellationToken,
    finished: CancellationToken,
}

impl Crawler {
    /// Creates a crawler for `plan`, fetching through `downloader`.
    pub fn new(plan: RunPlan, downloader: impl Downloader) -> Self {
        Self::with_shared_downloader(plan, Arc::new(downloader))
    }

    /// Like [`Crawler::new`], for a downloader shared with other runs.
    pub fn with_shared_downloader(plan: RunPlan, downloader: Arc<dyn Downloader>) -> Self {
        let plan = Arc::new(plan);
        let run = RunInfo::new(plan.spider());
        let context = RunContext {
            downloader,
            scheduler: Scheduler::new(),
            stats: StatCollector::new(),
            events: EventDispatcher::new(run, Arc::clone(&plan)),
            gate: DispatchGate::new(plan.concurrency(), plan.request_delay()),
            state: RunState::new(),
            plan,
        };
        Crawler {
            context: Arc::new(context),
            cancellation: CancellationToken::new(),
            finished: CancellationToken::new(),
        }
    }

    /// Identity of this run, as reported with every event.
    pub fn run_info(&self) -> &RunInfo {
        self.context.events.run()
    }

    pub fn plan(&self) -> &RunPlan {
        &self.context.plan
    }

    /// Token that stops the run when cancelled. Queued requests are no longer
    /// dequeued; in-flight ones finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Cancels the run on Ctrl-C. Must be called from within a Tokio runtime.
    pub fn cancel_on_ctrl_c(&self) {
        let cancellation = self.cancellation.clone();
        let finished = self.finished.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => {
                        info!("Ctrl-C received, initiating graceful shutdown.");
                        cancellation.cancel();
                    }
                    Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
                },
                _ = finished.cancelled() => {}
            }
        });
    }

    /// Watches the run's [`RunPhase`].
    pub fn phase(&self) -> watch::Receiver<RunPhase> {
        self.context.state.subscribe()
    }

    /// Runs the crawl to completion and returns its summary.
    pub async fn start_crawl(self) -> RunResult {
        let Crawler {
            context,
            cancellation,
            finished,
        } = self;
        let run = context.events.run().clone();
        info!(
            "Run {} of spider '{}' starting: concurrency={}, request_delay={:?}, {} seed requests",
            run.id,
            run.spider,
            context.plan.concurrency(),
            context.plan.request_delay(),
            context.plan.initial_requests().len()
        );

        context.state.set_phase(RunPhase::Running);
        context.events.emit(EventKind::RunStarted, || Event::RunStarted).await;
        for request in context.plan.initial_requests().iter().cloned() {
            context.schedule(request).await;
        }

        let mut tasks = JoinSet::new();
        dispatch(&context, &cancellation, &mut tasks).await;

        context.state.end_dispatch();
        trace!("Waiting for {} in-flight requests", tasks.len());
        while let Some(result) = tasks.join_next().await {
            context.task_finished(result);
        }
        context.scheduler.close();
        let requests_pending = context.scheduler.len();
        if requests_pending > 0 {
            info!("{} requests were left in the queue", requests_pending);
        }

        close_item_processors(&context).await;

        let result = context.stats.finish(requests_pending);
        info!(
            "Run {} finished: {} requests issued, {} succeeded, {} failed, {} items kept",
            run.id,
            result.requests_issued,
            result.requests_succeeded,
            result.requests_failed,
            result.items_kept
        );
        context
            .events
            .emit(EventKind::RunFinished, || Event::RunFinished {
                result: result.clone(),
            })
            .await;
        context.state.set_phase(RunPhase::Terminated);
        finished.cancel();
        result
    }
}

/// Dequeues and spawns requests until the run is idle or cancelled.
///
/// Taking the last queued request moves the run to `Draining`; scheduling a
/// follow-up moves it back to `Running`.
async fn dispatch(
    context: &Arc<RunContext>,
    cancellation: &CancellationToken,
    tasks: &mut JoinSet<()>,
) {
    loop {
        while let Some(result) = tasks.try_join_next() {
            context.task_finished(result);
        }

        let permit = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                info!("Cancellation requested, draining in-flight requests.");
                return;
            }
            permit = context.gate.acquire_slot() => match permit {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Dispatch gate closed: {}", e);
                    return;
                }
            },
        };

        match context.scheduler.next_request() {
            Some(request) => {
                trace!("Dispatching request for {}", request.url);
                let guard = context.state.enter();
                if context.scheduler.is_empty() {
                    context.state.set_phase(RunPhase::Draining);
                }
                let task_context = Arc::clone(context);
                tasks.spawn(async move {
                    let _permit = permit;
                    let _guard = guard;
                    process_request(task_context, request).await;
                });
            }
            None => {
                drop(permit);
                if context.scheduler.is_empty() {
                    if context.state.active() == 0 {
                        debug!("Queue is empty and no request is in flight.");
                        return;
                    }
                    context.state.set_phase(RunPhase::Draining);
                }
                tokio::select! {
                    _ = context.scheduler.notified() => {}
                    _ = context.state.pipeline_finished() => {}
                    _ = cancellation.cancelled() => {}
                }
            }
        }
    }
}

async fn close_item_processors(context: &RunContext) {
    let processors = context.plan.item_processors();
    if processors.is_empty() {
        return;
    }
    info!("Closing item processors...");
    let closing = processors
        .iter()
        .map(|processor| async move { (processor.name.as_str(), processor.unit.close().await) });
    for (name, result) in join_all(closing).await {
        if let Err(e) = result {
            error!("Item processor '{}' failed to close: {}", name, e);
        }
    }
    debug!("All item processors closed");
}
