//! # Scheduler Module
//!
//! Implements the request queue shared by every in-flight request of a run.
//!
//! ## Overview
//!
//! The `Scheduler` is the only structure several request pipelines mutate at
//! the same time: seeds are pushed before the run starts, and every pipeline
//! pushes the follow-up requests it produced. It is a FIFO lock-free queue
//! (`crossbeam::queue::SegQueue`), so requests pushed by one pipeline keep
//! their relative order.
//!
//! The dispatcher pops requests one at a time and parks on
//! [`Scheduler::notified`] while the queue is empty. Once the scheduler is
//! closed, pushes are refused and the remaining entries are only counted.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_run::{Request, Scheduler};
//!
//! let scheduler = Scheduler::new();
//! scheduler.enqueue_request(Request::get("https://example.com")?);
//! assert_eq!(scheduler.len(), 1);
//! let next = scheduler.next_request();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::queue::SegQueue;
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::request::Request;

#[derive(Debug, Default)]
pub struct Scheduler {
    request_queue: SegQueue<Request>,
    notify: Notify,
    is_shutting_down: AtomicBool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `request` to the queue and wakes the dispatcher.
    ///
    /// Returns `false` (and discards the request) once the scheduler is
    /// closed.
    pub fn enqueue_request(&self, request: Request) -> bool {
        if self.is_shutting_down.load(Ordering::SeqCst) {
            debug!("Scheduler is closed, discarding request for {}", request.url);
            return false;
        }
        trace!("Enqueuing request: {}", request.url);
        self.request_queue.push(request);
        self.notify.notify_one();
        true
    }

    /// Pops the oldest queued request, if any.
    pub fn next_request(&self) -> Option<Request> {
        self.request_queue.pop()
    }

    /// Resolves after the next [`enqueue_request`](Self::enqueue_request), or
    /// immediately if one happened since the last wake-up was consumed.
    pub async fn notified(&self) {
        self.notify.notified().await
    }

    /// Refuses further requests. Queued entries stay where they are.
    pub fn close(&self) {
        self.is_shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.is_shutting_down.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.request_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request_queue.is_empty()
    }
}
