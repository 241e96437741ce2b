//! Limits how deep a crawl follows links.
//!
//! Seed requests count as depth 1. Every follow-up request is tagged with its
//! parent's depth plus one and dropped once it exceeds `max_crawl_depth`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::configuration::{parse_options, Configurable, Options};
use crate::error::SpiderError;
use crate::item::Outcome;
use crate::request::Request;
use crate::response::Response;

use super::ResponseMiddleware;

pub const DEPTH: &str = "depth";

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DepthOptions {
    max_crawl_depth: u64,
}

impl Default for DepthOptions {
    fn default() -> Self {
        Self { max_crawl_depth: 10 }
    }
}

#[derive(Debug)]
pub struct MaximumCrawlDepthMiddleware {
    max_crawl_depth: u64,
}

impl MaximumCrawlDepthMiddleware {
    pub fn new(max_crawl_depth: u64) -> Self {
        Self { max_crawl_depth }
    }
}

impl Default for MaximumCrawlDepthMiddleware {
    fn default() -> Self {
        Self::new(DepthOptions::default().max_crawl_depth)
    }
}

impl Configurable for MaximumCrawlDepthMiddleware {
    fn configure(&mut self, options: Options) -> Result<(), SpiderError> {
        let options: DepthOptions = parse_options(options)?;
        self.max_crawl_depth = options.max_crawl_depth;
        Ok(())
    }
}

#[async_trait]
impl ResponseMiddleware for MaximumCrawlDepthMiddleware {
    async fn handle_request(
        &self,
        mut request: Request,
        response: &Response,
    ) -> Result<Outcome<Request>, SpiderError> {
        let depth = response.request().meta_u64(DEPTH).unwrap_or(1) + 1;
        if depth > self.max_crawl_depth {
            return Ok(Outcome::dropped(format!(
                "maximum crawl depth of {} reached",
                self.max_crawl_depth
            )));
        }
        request.set_meta(DEPTH, depth);
        Ok(Outcome::Kept(request))
    }
}
