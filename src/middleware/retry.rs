//! Re-issues requests whose fetch failed or came back with a retryable status.
//!
//! The retry is a new queue entry carrying a `retry_count` meta value; the
//! failed response itself is dropped. Once `max_retries` is reached the
//! response is passed on unchanged so later stages can observe the failure.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::configuration::{parse_options, Configurable, Options};
use crate::error::SpiderError;
use crate::item::{Outcome, ParseOutput};
use crate::response::Response;

use super::dedup::DONT_FILTER;
use super::DownloaderMiddleware;

pub const RETRY_COUNT: &str = "retry_count";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryOptions {
    pub max_retries: u64,
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_on_status: vec![429, 500, 502, 503, 504],
        }
    }
}

#[derive(Debug, Default)]
pub struct RetryMiddleware {
    options: RetryOptions,
}

impl RetryMiddleware {
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    fn should_retry(&self, response: &Response) -> bool {
        match response.status() {
            None => true,
            Some(status) => self.options.retry_on_status.contains(&status.as_u16()),
        }
    }
}

impl Configurable for RetryMiddleware {
    fn configure(&mut self, options: Options) -> Result<(), SpiderError> {
        self.options = parse_options(options)?;
        Ok(())
    }
}

#[async_trait]
impl DownloaderMiddleware for RetryMiddleware {
    async fn handle_response(
        &self,
        response: Response,
        output: &mut ParseOutput,
    ) -> Result<Outcome<Response>, SpiderError> {
        if !self.should_retry(&response) {
            return Ok(Outcome::Kept(response));
        }

        let attempts = response.request().meta_u64(RETRY_COUNT).unwrap_or(0);
        if attempts >= self.options.max_retries {
            debug!(
                "Giving up on {} after {} retries",
                response.request().url,
                attempts
            );
            return Ok(Outcome::Kept(response));
        }

        let mut retry = response.request().clone();
        retry.set_meta(RETRY_COUNT, attempts + 1);
        retry.set_meta(DONT_FILTER, true);
        debug!(
            "Retrying {} (attempt {} of {})",
            retry.url,
            attempts + 1,
            self.options.max_retries
        );
        output.add_request(retry);

        Ok(Outcome::dropped(format!(
            "retry {} of {} scheduled",
            attempts + 1,
            self.options.max_retries
        )))
    }
}
