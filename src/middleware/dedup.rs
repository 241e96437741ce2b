//! Drops requests for urls that were already requested during the run.

use async_trait::async_trait;
use dashmap::DashSet;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::configuration::{parse_options, Configurable, Options};
use crate::error::SpiderError;
use crate::item::Outcome;
use crate::request::Request;

use super::DownloaderMiddleware;

/// Request meta flag that exempts a request from deduplication.
pub const DONT_FILTER: &str = "dont_filter";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeduplicationOptions {
    pub ignore_url_fragments: bool,
    pub ignore_trailing_slashes: bool,
    pub ignore_query_string: bool,
}

impl Default for DeduplicationOptions {
    fn default() -> Self {
        Self {
            ignore_url_fragments: false,
            ignore_trailing_slashes: true,
            ignore_query_string: false,
        }
    }
}

/// Seen urls are shared by every in-flight request of the run, so the check
/// and the insert happen as one step on a concurrent set.
#[derive(Debug, Default)]
pub struct RequestDeduplicationMiddleware {
    options: DeduplicationOptions,
    seen: DashSet<String>,
}

impl RequestDeduplicationMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    fn canonical_url(&self, url: &Url) -> String {
        let mut url = url.clone();
        if self.options.ignore_url_fragments {
            url.set_fragment(None);
        }
        if self.options.ignore_query_string {
            url.set_query(None);
        }
        if self.options.ignore_trailing_slashes {
            let path = url.path().trim_end_matches('/').to_string();
            url.set_path(&path);
        }
        url.to_string()
    }
}

impl Configurable for RequestDeduplicationMiddleware {
    fn configure(&mut self, options: Options) -> Result<(), SpiderError> {
        self.options = parse_options(options)?;
        Ok(())
    }
}

#[async_trait]
impl DownloaderMiddleware for RequestDeduplicationMiddleware {
    async fn handle_request(&self, request: Request) -> Result<Outcome<Request>, SpiderError> {
        if request.meta(DONT_FILTER).and_then(|v| v.as_bool()) == Some(true) {
            return Ok(Outcome::Kept(request));
        }
        let key = format!("{} {}", request.method, self.canonical_url(&request.url));
        if !self.seen.insert(key) {
            debug!("Dropping duplicate request: {}", request.url);
            return Ok(Outcome::dropped("duplicate request"));
        }
        Ok(Outcome::Kept(request))
    }
}
