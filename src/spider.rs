//! # Spider Module
//!
//! Defines the `Spider` trait: the object a crawl is built from.
//!
//! ## Overview
//!
//! A spider declares which pipeline it wants (its [`PipelineDescription`]) and
//! which requests the crawl starts with. It does not parse responses itself;
//! extraction is the job of the response middleware listed in its
//! configuration.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_run::prelude::*;
//!
//! struct ArticleSpider {
//!     configuration: PipelineDescription,
//! }
//!
//! impl Spider for ArticleSpider {
//!     fn start_urls(&self) -> Vec<&str> {
//!         vec!["https://example.com/articles"]
//!     }
//!
//!     fn load_configuration(&self) -> PipelineDescription {
//!         self.configuration.clone()
//!     }
//!
//!     fn with_configuration(&mut self, configuration: PipelineDescription) {
//!         self.configuration = configuration;
//!     }
//! }
//! ```

use url::Url;

use crate::configuration::PipelineDescription;
use crate::error::SpiderError;
use crate::request::Request;

/// Defines the contract for a web spider.
pub trait Spider: Send + Sync + 'static {
    /// Identity of the spider, reported with every event of its runs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// The pipeline this spider declares.
    fn load_configuration(&self) -> PipelineDescription;

    /// Stores the effective configuration after overrides were applied, so
    /// later introspection sees what actually ran. Not called for builds
    /// without overrides.
    fn with_configuration(&mut self, configuration: PipelineDescription);

    /// Returns the initial URLs to start crawling from.
    fn start_urls(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Generates the seed requests. Defaults to a `GET` per start url.
    fn initial_requests(&self) -> Result<Vec<Request>, SpiderError> {
        let urls: Result<Vec<Url>, url::ParseError> =
            self.start_urls().into_iter().map(Url::parse).collect();
        Ok(urls?.into_iter().map(Request::new).collect())
    }
}
