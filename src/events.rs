//! Lifecycle events delivered to extensions.

use uuid::Uuid;

use crate::item::Item;
use crate::request::Request;
use crate::response::Response;
use crate::stats::RunResult;

/// Identity of the run an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub id: Uuid,
    pub spider: String,
}

impl RunInfo {
    pub fn new(spider: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            spider: spider.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RunStarted,
    RequestScheduled,
    RequestDropped,
    RequestSending,
    ResponseReceived,
    ResponseDropped,
    ItemExtracted,
    ItemDropped,
    ItemProcessed,
    RunFinished,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::RunStarted,
        EventKind::RequestScheduled,
        EventKind::RequestDropped,
        EventKind::RequestSending,
        EventKind::ResponseReceived,
        EventKind::ResponseDropped,
        EventKind::ItemExtracted,
        EventKind::ItemDropped,
        EventKind::ItemProcessed,
        EventKind::RunFinished,
    ];
}

#[derive(Debug, Clone)]
pub enum Event {
    RunStarted,
    /// A request entered the queue.
    RequestScheduled { request: Request },
    /// A request was dropped before it reached the transport, or a follow-up
    /// request was filtered out before it was queued.
    RequestDropped { request: Request, reason: String },
    /// A request passed the dispatch gate and is handed to the transport.
    RequestSending { request: Request },
    /// The transport returned, successfully or not.
    ResponseReceived { response: Response },
    ResponseDropped { response: Response, reason: String },
    ItemExtracted { item: Item },
    ItemDropped { item: Item, reason: String },
    /// An item made it through every item processor.
    ItemProcessed { item: Item },
    RunFinished { result: RunResult },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::RunStarted => EventKind::RunStarted,
            Event::RequestScheduled { .. } => EventKind::RequestScheduled,
            Event::RequestDropped { .. } => EventKind::RequestDropped,
            Event::RequestSending { .. } => EventKind::RequestSending,
            Event::ResponseReceived { .. } => EventKind::ResponseReceived,
            Event::ResponseDropped { .. } => EventKind::ResponseDropped,
            Event::ItemExtracted { .. } => EventKind::ItemExtracted,
            Event::ItemDropped { .. } => EventKind::ItemDropped,
            Event::ItemProcessed { .. } => EventKind::ItemProcessed,
            Event::RunFinished { .. } => EventKind::RunFinished,
        }
    }
}
