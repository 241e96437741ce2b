//! A "prelude" for users of the `spider-run` crate.
//!
//! This prelude re-exports the most commonly used traits and structs so that
//! they can be easily imported.
//!
//! # Example
//!
//! ```
//! use spider_run::prelude::*;
//! ```

pub use crate::{
    // Core structs
    Crawler,
    PipelineAssembler,
    Registry,
    ReqwestDownloader,
    RunResult,
    // Core traits
    Configurable,
    Downloader,
    DownloaderMiddleware,
    Extension,
    ItemProcessor,
    ResponseMiddleware,
    Resolver,
    Spider,
    // Data types
    Event,
    EventKind,
    Item,
    Options,
    Outcome,
    Overrides,
    ParseOutput,
    PipelineDescription,
    Request,
    Response,
    RunInfo,
    SpiderError,
    UnitReference,
    // Essential re-exports for trait implementation
    async_trait,
};

pub use crate::configuration::parse_options;
