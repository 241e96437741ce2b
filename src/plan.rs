//! The immutable, fully resolved description of one crawl.

use std::time::Duration;

use crate::configuration::PipelineDescription;
use crate::extensions::ExtensionHandle;
use crate::middleware::{DownloaderMiddlewareAdapter, ResponseMiddlewareAdapter};
use crate::pipeline::ItemProcessor;
use crate::request::Request;
use crate::resolver::ResolvedUnit;

/// Everything the engine needs to execute a crawl.
///
/// Built once by [`PipelineAssembler`](crate::builder::PipelineAssembler) and
/// never modified afterwards; the engine shares it read-only between all
/// in-flight requests.
pub struct RunPlan {
    pub(crate) initial_requests: Vec<Request>,
    pub(crate) spider: String,
    pub(crate) configuration: PipelineDescription,
    pub(crate) downloader_middleware: Vec<DownloaderMiddlewareAdapter>,
    pub(crate) response_middleware: Vec<ResponseMiddlewareAdapter>,
    pub(crate) item_processors: Vec<ResolvedUnit<dyn ItemProcessor>>,
    pub(crate) extensions: Vec<ExtensionHandle>,
}

impl RunPlan {
    pub fn initial_requests(&self) -> &[Request] {
        &self.initial_requests
    }

    /// Name of the spider the plan was built from.
    pub fn spider(&self) -> &str {
        &self.spider
    }

    /// The effective description, overrides applied.
    pub fn configuration(&self) -> &PipelineDescription {
        &self.configuration
    }

    pub fn downloader_middleware(&self) -> &[DownloaderMiddlewareAdapter] {
        &self.downloader_middleware
    }

    pub fn response_middleware(&self) -> &[ResponseMiddlewareAdapter] {
        &self.response_middleware
    }

    pub fn item_processors(&self) -> &[ResolvedUnit<dyn ItemProcessor>] {
        &self.item_processors
    }

    pub fn extensions(&self) -> &[ExtensionHandle] {
        &self.extensions
    }

    pub fn concurrency(&self) -> usize {
        self.configuration.concurrency
    }

    pub fn request_delay(&self) -> Duration {
        self.configuration.request_delay
    }
}

impl std::fmt::Debug for RunPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunPlan")
            .field("spider", &self.spider)
            .field("initial_requests", &self.initial_requests.len())
            .field("downloader_middleware", &self.downloader_middleware)
            .field("response_middleware", &self.response_middleware)
            .field(
                "item_processors",
                &self
                    .item_processors
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("extensions", &self.extensions)
            .field("concurrency", &self.concurrency())
            .field("request_delay", &self.request_delay())
            .finish()
    }
}
