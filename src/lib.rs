//! # spider-run
//!
//! Run assembly and execution engine for pluggable web crawlers.
//!
//! A [`Spider`] declares its pipeline as a [`PipelineDescription`]: ordered
//! lists of downloader middleware, response middleware, item processors and
//! extensions, referenced by identifier. The [`PipelineAssembler`] resolves
//! those references through a [`Resolver`] into an immutable [`RunPlan`], and
//! the [`Crawler`] executes the plan under a concurrency bound and a dispatch
//! delay, returning a [`RunResult`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spider_run::prelude::*;
//!
//! #[derive(Default)]
//! struct MySpider {
//!     configuration: PipelineDescription,
//! }
//!
//! impl Spider for MySpider {
//!     fn start_urls(&self) -> Vec<&str> {
//!         vec!["https://example.com"]
//!     }
//!
//!     fn load_configuration(&self) -> PipelineDescription {
//!         PipelineDescription {
//!             downloader_middleware: vec!["user-agent".into(), "retry".into()],
//!             extensions: vec!["stats-collector".into()],
//!             ..Default::default()
//!         }
//!     }
//!
//!     fn with_configuration(&mut self, configuration: PipelineDescription) {
//!         self.configuration = configuration;
//!     }
//! }
//!
//! async fn run_crawler() -> Result<RunResult, SpiderError> {
//!     let assembler = PipelineAssembler::new(Arc::new(Registry::with_builtins()));
//!     let plan = assembler.build(&mut MySpider::default(), None)?;
//!     let crawler = Crawler::new(plan, ReqwestDownloader::default());
//!     crawler.cancel_on_ctrl_c();
//!     Ok(crawler.start_crawl().await)
//! }
//! ```

pub mod builder;
mod concurrency;
pub mod configuration;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod events;
pub mod extensions;
pub mod item;
pub mod middleware;
pub mod pipeline;
pub mod plan;
pub mod prelude;
pub mod request;
pub mod resolver;
pub mod response;
pub mod scheduler;
pub mod spider;
pub mod state;
pub mod stats;

pub use builder::PipelineAssembler;
pub use configuration::{Configurable, Options, Overrides, PipelineDescription, UnitReference};
pub use crawler::Crawler;
pub use downloader::{Downloader, ReqwestDownloader};
pub use error::{SpiderError, TransportFailure, UnitCategory};
pub use events::{Event, EventKind, RunInfo};
pub use extensions::Extension;
pub use item::{Item, Outcome, ParseOutput};
pub use middleware::{DownloaderMiddleware, ResponseMiddleware};
pub use pipeline::ItemProcessor;
pub use plan::RunPlan;
pub use request::Request;
pub use resolver::{ConfigurableResolver, Registry, Resolver};
pub use response::Response;
pub use scheduler::Scheduler;
pub use spider::Spider;
pub use state::RunPhase;
pub use stats::RunResult;

pub use async_trait::async_trait;
pub use tokio;
