//! # Statistics Module
//!
//! Counts what happens during a run and produces the final [`RunResult`].
//!
//! The engine owns one `StatCollector` per run. Every in-flight request
//! updates it concurrently, so all counters are atomics. When the run
//! terminates the collector is frozen into a `RunResult`, which is handed to
//! the caller and to extensions through the `RunFinished` event.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::SpiderError;

/// Collects counters about the run's operation.
#[derive(Debug)]
pub(crate) struct StatCollector {
    start_time: Instant,

    requests_scheduled: AtomicUsize,
    requests_issued: AtomicUsize,
    requests_succeeded: AtomicUsize,
    requests_failed: AtomicUsize,
    requests_dropped: AtomicUsize,

    responses_received: AtomicUsize,
    responses_dropped: AtomicUsize,
    bytes_downloaded: AtomicUsize,

    items_extracted: AtomicUsize,
    items_kept: AtomicUsize,
    items_dropped: AtomicUsize,

    stage_errors: AtomicUsize,
}

impl StatCollector {
    pub(crate) fn new() -> Self {
        StatCollector {
            start_time: Instant::now(),
            requests_scheduled: AtomicUsize::new(0),
            requests_issued: AtomicUsize::new(0),
            requests_succeeded: AtomicUsize::new(0),
            requests_failed: AtomicUsize::new(0),
            requests_dropped: AtomicUsize::new(0),
            responses_received: AtomicUsize::new(0),
            responses_dropped: AtomicUsize::new(0),
            bytes_downloaded: AtomicUsize::new(0),
            items_extracted: AtomicUsize::new(0),
            items_kept: AtomicUsize::new(0),
            items_dropped: AtomicUsize::new(0),
            stage_errors: AtomicUsize::new(0),
        }
    }

    pub(crate) fn increment_requests_scheduled(&self) {
        self.requests_scheduled.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_issued(&self) {
        self.requests_issued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_dropped(&self) {
        self.requests_dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_responses_received(&self) {
        self.responses_received.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_responses_dropped(&self) {
        self.responses_dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn add_bytes_downloaded(&self, bytes: usize) {
        self.bytes_downloaded.fetch_add(bytes, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_extracted(&self) {
        self.items_extracted.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_kept(&self) {
        self.items_kept.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_dropped(&self) {
        self.items_dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_stage_errors(&self) {
        self.stage_errors.fetch_add(1, Ordering::SeqCst);
    }

    /// Freezes the counters. `requests_pending` is what was left in the queue.
    pub(crate) fn finish(&self, requests_pending: usize) -> RunResult {
        RunResult {
            requests_scheduled: self.requests_scheduled.load(Ordering::SeqCst),
            requests_issued: self.requests_issued.load(Ordering::SeqCst),
            requests_succeeded: self.requests_succeeded.load(Ordering::SeqCst),
            requests_failed: self.requests_failed.load(Ordering::SeqCst),
            requests_dropped: self.requests_dropped.load(Ordering::SeqCst),
            requests_pending,
            responses_received: self.responses_received.load(Ordering::SeqCst),
            responses_dropped: self.responses_dropped.load(Ordering::SeqCst),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::SeqCst),
            items_extracted: self.items_extracted.load(Ordering::SeqCst),
            items_kept: self.items_kept.load(Ordering::SeqCst),
            items_dropped: self.items_dropped.load(Ordering::SeqCst),
            stage_errors: self.stage_errors.load(Ordering::SeqCst),
            elapsed: self.start_time.elapsed(),
        }
    }
}

/// Terminal summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Requests put on the queue, seeds included.
    pub requests_scheduled: usize,
    /// Requests handed to the transport.
    pub requests_issued: usize,
    /// Issued requests the transport answered.
    pub requests_succeeded: usize,
    /// Issued requests that ended in a transport failure.
    pub requests_failed: usize,
    /// Requests dropped by middleware, before fetching or before queueing.
    pub requests_dropped: usize,
    /// Requests still queued when a cancelled run terminated.
    pub requests_pending: usize,
    pub responses_received: usize,
    pub responses_dropped: usize,
    pub bytes_downloaded: usize,
    pub items_extracted: usize,
    pub items_kept: usize,
    pub items_dropped: usize,
    /// Unexpected errors raised by middleware or item processors.
    pub stage_errors: usize,
    #[serde(serialize_with = "serialize_elapsed")]
    pub elapsed: Duration,
}

fn serialize_elapsed<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

impl RunResult {
    fn formatted_duration(&self) -> String {
        format!("{:?}", self.elapsed)
    }

    fn requests_per_second(&self) -> f64 {
        let total_seconds = self.elapsed.as_secs_f64();
        if total_seconds > 0.0 {
            self.requests_issued as f64 / total_seconds
        } else {
            0.0
        }
    }

    fn items_per_second(&self) -> f64 {
        let total_seconds = self.elapsed.as_secs_f64();
        if total_seconds > 0.0 {
            self.items_kept as f64 / total_seconds
        } else {
            0.0
        }
    }

    fn formatted_bytes(&self) -> String {
        const KB: usize = 1024;
        const MB: usize = 1024 * KB;
        const GB: usize = 1024 * MB;

        if self.bytes_downloaded >= GB {
            format!("{:.2} GB", self.bytes_downloaded as f64 / GB as f64)
        } else if self.bytes_downloaded >= MB {
            format!("{:.2} MB", self.bytes_downloaded as f64 / MB as f64)
        } else if self.bytes_downloaded >= KB {
            format!("{:.2} KB", self.bytes_downloaded as f64 / KB as f64)
        } else {
            format!("{} B", self.bytes_downloaded)
        }
    }

    pub fn to_json_string(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_markdown_string(&self) -> String {
        format!(
            r#"# Crawl Statistics Report

- **Duration**: {}
- **Average Speed**: {:.2} req/s, {:.2} item/s

## Requests
| Metric     | Count |
|------------|-------|
| Scheduled  | {} |
| Issued     | {} |
| Succeeded  | {} |
| Failed     | {} |
| Dropped    | {} |
| Pending    | {} |

## Responses
| Metric     | Count |
|------------|-------|
| Received   | {} |
| Dropped    | {} |
| Downloaded | {} |

## Items
| Metric     | Count |
|------------|-------|
| Extracted  | {} |
| Kept       | {} |
| Dropped    | {} |

Stage errors: {}
"#,
            self.formatted_duration(),
            self.requests_per_second(),
            self.items_per_second(),
            self.requests_scheduled,
            self.requests_issued,
            self.requests_succeeded,
            self.requests_failed,
            self.requests_dropped,
            self.requests_pending,
            self.responses_received,
            self.responses_dropped,
            self.formatted_bytes(),
            self.items_extracted,
            self.items_kept,
            self.items_dropped,
            self.stage_errors,
        )
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nCrawl Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "  duration : {}", self.formatted_duration())?;
        writeln!(
            f,
            "  speed    : req/s: {:.2}, item/s: {:.2}",
            self.requests_per_second(),
            self.items_per_second()
        )?;
        writeln!(
            f,
            "  requests : scheduled: {}, issued: {}, ok: {}, fail: {}, drop: {}, pending: {}",
            self.requests_scheduled,
            self.requests_issued,
            self.requests_succeeded,
            self.requests_failed,
            self.requests_dropped,
            self.requests_pending
        )?;
        writeln!(
            f,
            "  response : received: {}, dropped: {}, downloaded: {}",
            self.responses_received,
            self.responses_dropped,
            self.formatted_bytes()
        )?;
        writeln!(
            f,
            "  items    : extracted: {}, kept: {}, dropped: {}",
            self.items_extracted, self.items_kept, self.items_dropped
        )?;
        writeln!(f, "  errors   : {}\n", self.stage_errors)
    }
}
