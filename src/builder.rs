//! # Builder Module
//!
//! Provides the `PipelineAssembler`, which turns a spider's declared pipeline
//! into an executable [`RunPlan`].
//!
//! ## Overview
//!
//! Assembly happens once, before anything is fetched:
//!
//! 1. the spider's [`PipelineDescription`] is loaded and the caller's
//!    [`Overrides`] are merged over it;
//! 2. the merged description is handed back to the spider;
//! 3. engine settings are validated;
//! 4. every unit reference is resolved and configured, category by category,
//!    in declaration order;
//! 5. the spider's seed requests are collected.
//!
//! The first failure aborts assembly and no plan is returned.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spider_run::prelude::*;
//!
//! async fn crawl(mut spider: MySpider) -> Result<RunResult, SpiderError> {
//!     let assembler = PipelineAssembler::new(Arc::new(Registry::with_builtins()));
//!     let plan = assembler.build(&mut spider, None)?;
//!
//!     let crawler = Crawler::new(plan, ReqwestDownloader::default());
//!     Ok(crawler.start_crawl().await)
//! }
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::configuration::{Overrides, PipelineDescription};
use crate::error::SpiderError;
use crate::extensions::ExtensionHandle;
use crate::middleware::{DownloaderMiddlewareAdapter, ResponseMiddlewareAdapter};
use crate::plan::RunPlan;
use crate::resolver::{ConfigurableResolver, Resolver};
use crate::spider::Spider;

/// Builds [`RunPlan`]s from spiders.
#[derive(Clone)]
pub struct PipelineAssembler {
    resolver: ConfigurableResolver,
}

impl PipelineAssembler {
    /// Creates an assembler resolving units through `resolver`.
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver: ConfigurableResolver::new(resolver),
        }
    }

    /// Assembles the plan for one run of `spider`.
    ///
    /// Fields present in `overrides` replace the spider's own. When overrides
    /// are given, the merged description is stored back on the spider through
    /// [`Spider::with_configuration`].
    pub fn build<S: Spider>(
        &self,
        spider: &mut S,
        overrides: Option<&Overrides>,
    ) -> Result<RunPlan, SpiderError> {
        let declared = spider.load_configuration();
        let configuration = match overrides {
            Some(overrides) => {
                let merged = declared.with_overrides(overrides);
                spider.with_configuration(merged.clone());
                merged
            }
            None => declared,
        };
        configuration.validate()?;

        let plan = self.resolve(spider, configuration)?;
        info!(
            "Assembled plan for spider '{}': {} downloader middleware, {} response middleware, {} item processors, {} extensions, {} seed requests",
            plan.spider,
            plan.downloader_middleware.len(),
            plan.response_middleware.len(),
            plan.item_processors.len(),
            plan.extensions.len(),
            plan.initial_requests.len()
        );
        Ok(plan)
    }

    fn resolve<S: Spider>(
        &self,
        spider: &S,
        configuration: PipelineDescription,
    ) -> Result<RunPlan, SpiderError> {
        let downloader_middleware = configuration
            .downloader_middleware
            .iter()
            .map(|reference| {
                self.resolver
                    .resolve_downloader_middleware(reference)
                    .map(|resolved| {
                        DownloaderMiddlewareAdapter::from_middleware(
                            resolved.name,
                            resolved.options,
                            resolved.unit,
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let response_middleware = configuration
            .response_middleware
            .iter()
            .map(|reference| {
                self.resolver
                    .resolve_response_middleware(reference)
                    .map(|resolved| {
                        ResponseMiddlewareAdapter::from_middleware(
                            resolved.name,
                            resolved.options,
                            resolved.unit,
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let item_processors = configuration
            .item_processors
            .iter()
            .map(|reference| self.resolver.resolve_item_processor(reference))
            .collect::<Result<Vec<_>, _>>()?;

        let extensions = configuration
            .extensions
            .iter()
            .map(|reference| {
                self.resolver
                    .resolve_extension(reference)
                    .map(ExtensionHandle::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let initial_requests = spider.initial_requests()?;
        debug!("Collected {} seed requests", initial_requests.len());

        Ok(RunPlan {
            initial_requests,
            spider: spider.name().to_string(),
            configuration,
            downloader_middleware,
            response_middleware,
            item_processors,
            extensions,
        })
    }
}

impl std::fmt::Debug for PipelineAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineAssembler").finish_non_exhaustive()
    }
}
