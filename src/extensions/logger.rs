//! Logs every lifecycle event through `tracing`.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::configuration::Configurable;
use crate::error::SpiderError;
use crate::events::{Event, RunInfo};

use super::Extension;

#[derive(Debug, Default)]
pub struct LoggerExtension;

impl Configurable for LoggerExtension {}

#[async_trait]
impl Extension for LoggerExtension {
    async fn handle_event(&self, run: &RunInfo, event: &Event) -> Result<(), SpiderError> {
        match event {
            Event::RunStarted => info!(run = %run.id, spider = %run.spider, "Run starting"),
            Event::RequestScheduled { request } => {
                debug!(run = %run.id, url = %request.url, "Request scheduled")
            }
            Event::RequestDropped { request, reason } => {
                info!(run = %run.id, url = %request.url, reason = %reason, "Request dropped")
            }
            Event::RequestSending { request } => {
                debug!(run = %run.id, url = %request.url, "Dispatching request")
            }
            Event::ResponseReceived { response } => match response.failure() {
                Some(failure) => info!(
                    run = %run.id,
                    url = %response.url,
                    error = %failure,
                    "Request failed"
                ),
                None => debug!(
                    run = %run.id,
                    url = %response.url,
                    status = ?response.status(),
                    "Response received"
                ),
            },
            Event::ResponseDropped { response, reason } => {
                info!(run = %run.id, url = %response.url, reason = %reason, "Response dropped")
            }
            Event::ItemExtracted { .. } => debug!(run = %run.id, "Item extracted"),
            Event::ItemDropped { reason, .. } => {
                info!(run = %run.id, reason = %reason, "Item dropped")
            }
            Event::ItemProcessed { .. } => debug!(run = %run.id, "Item processed"),
            Event::RunFinished { result } => info!(
                run = %run.id,
                spider = %run.spider,
                requests_issued = result.requests_issued,
                items_kept = result.items_kept,
                "Run finished"
            ),
        }
        Ok(())
    }
}
