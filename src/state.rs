//! Module for tracking the operational state of a run.
//!
//! [`RunPhase`] is published through a `tokio::sync::watch` channel so hosts
//! can observe the run from the outside. [`RunState`] counts the request
//! pipelines that are still alive; the dispatcher uses it to decide when a run
//! is finished, which is the case once the queue is empty and this count is
//! zero.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tracing::debug;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// The plan was accepted, nothing was fetched yet.
    Idle,
    /// Requests are waiting in the queue.
    Running,
    /// The queue is empty, or no longer dequeued after cancellation; in-flight
    /// work is finishing.
    Draining,
    /// The run result is available.
    Terminated,
}

/// Shared state of the run's request pipelines.
#[derive(Debug)]
pub(crate) struct RunState {
    active: AtomicUsize,
    idle: Notify,
    dispatch_over: AtomicBool,
    phase: watch::Sender<RunPhase>,
}

impl RunState {
    pub(crate) fn new() -> Arc<Self> {
        let (phase, _) = watch::channel(RunPhase::Idle);
        Arc::new(Self {
            active: AtomicUsize::new(0),
            idle: Notify::new(),
            dispatch_over: AtomicBool::new(false),
            phase,
        })
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    /// Moves to `phase`. `Terminated` is final, and once dispatch is over the
    /// run never goes back to `Running`.
    pub(crate) fn set_phase(&self, phase: RunPhase) {
        if phase == RunPhase::Running && self.dispatch_over.load(Ordering::SeqCst) {
            return;
        }
        self.phase.send_if_modified(|current| {
            if *current == phase || *current == RunPhase::Terminated {
                return false;
            }
            debug!("Run phase {:?} -> {:?}", current, phase);
            *current = phase;
            true
        });
    }

    /// Nothing is dequeued anymore; the run drains what is in flight.
    pub(crate) fn end_dispatch(&self) {
        self.dispatch_over.store(true, Ordering::SeqCst);
        self.set_phase(RunPhase::Draining);
    }

    /// Registers a live request pipeline. It stays counted until the guard is
    /// dropped, including when the pipeline panics.
    pub(crate) fn enter(self: &Arc<Self>) -> ActiveGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ActiveGuard {
            state: Arc::clone(self),
        }
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves after some pipeline finished.
    pub(crate) async fn pipeline_finished(&self) {
        self.idle.notified().await
    }
}

pub(crate) struct ActiveGuard {
    state: Arc<RunState>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
        self.state.idle.notify_one();
    }
}
