//! # Resolver Module
//!
//! Turns unit references into configured unit instances.
//!
//! Instantiation itself is delegated to a [`Resolver`], the external service
//! that knows how to build a unit from its identifier (and how to satisfy the
//! unit's own dependencies). [`Registry`] is the stock implementation: a map
//! from identifier to factory per capability category. Hosts with their own
//! container can implement `Resolver` directly.
//!
//! [`ConfigurableResolver`] sits on top: it normalizes a [`UnitReference`],
//! asks the resolver for a fresh instance and applies the options.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::configuration::{Configurable, Options, UnitReference};
use crate::error::{SpiderError, UnitCategory};
use crate::extensions::logger::LoggerExtension;
use crate::extensions::stats::StatsCollectorExtension;
use crate::extensions::Extension;
use crate::middleware::dedup::RequestDeduplicationMiddleware;
use crate::middleware::depth::MaximumCrawlDepthMiddleware;
use crate::middleware::retry::RetryMiddleware;
use crate::middleware::user_agent::UserAgentMiddleware;
use crate::middleware::{DownloaderMiddleware, ResponseMiddleware};
use crate::pipeline::ItemProcessor;

/// Produces unit instances by identifier, one lookup per capability.
///
/// Every call must return a new instance; units are never shared between
/// references or runs.
pub trait Resolver: Send + Sync {
    fn downloader_middleware(&self, identifier: &str) -> Option<Box<dyn DownloaderMiddleware>>;
    fn response_middleware(&self, identifier: &str) -> Option<Box<dyn ResponseMiddleware>>;
    fn item_processor(&self, identifier: &str) -> Option<Box<dyn ItemProcessor>>;
    fn extension(&self, identifier: &str) -> Option<Box<dyn Extension>>;
}

type DownloaderFactory = Arc<dyn Fn() -> Box<dyn DownloaderMiddleware> + Send + Sync>;
type ResponseFactory = Arc<dyn Fn() -> Box<dyn ResponseMiddleware> + Send + Sync>;
type ProcessorFactory = Arc<dyn Fn() -> Box<dyn ItemProcessor> + Send + Sync>;
type ExtensionFactory = Arc<dyn Fn() -> Box<dyn Extension> + Send + Sync>;

/// Identifier to factory maps.
///
/// A type that plays several roles is registered once per role, usually under
/// the same identifier.
#[derive(Clone, Default)]
pub struct Registry {
    downloader_middleware: HashMap<String, DownloaderFactory>,
    response_middleware: HashMap<String, ResponseFactory>,
    item_processors: HashMap<String, ProcessorFactory>,
    extensions: HashMap<String, ExtensionFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in units.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_downloader_middleware("request-deduplication", RequestDeduplicationMiddleware::new)
            .register_downloader_middleware("user-agent", UserAgentMiddleware::default)
            .register_downloader_middleware("retry", RetryMiddleware::default)
            .register_response_middleware("max-crawl-depth", MaximumCrawlDepthMiddleware::default)
            .register_extension("logger", LoggerExtension::default)
            .register_extension("stats-collector", StatsCollectorExtension::default);
        registry
    }

    pub fn register_downloader_middleware<M, F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        M: DownloaderMiddleware,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.downloader_middleware.insert(
            identifier.into(),
            Arc::new(move || Box::new(factory()) as Box<dyn DownloaderMiddleware>),
        );
        self
    }

    pub fn register_response_middleware<M, F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        M: ResponseMiddleware,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.response_middleware.insert(
            identifier.into(),
            Arc::new(move || Box::new(factory()) as Box<dyn ResponseMiddleware>),
        );
        self
    }

    pub fn register_item_processor<P, F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        P: ItemProcessor,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.item_processors.insert(
            identifier.into(),
            Arc::new(move || Box::new(factory()) as Box<dyn ItemProcessor>),
        );
        self
    }

    pub fn register_extension<E, F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        E: Extension,
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.extensions.insert(
            identifier.into(),
            Arc::new(move || Box::new(factory()) as Box<dyn Extension>),
        );
        self
    }
}

impl Resolver for Registry {
    fn downloader_middleware(&self, identifier: &str) -> Option<Box<dyn DownloaderMiddleware>> {
        self.downloader_middleware.get(identifier).map(|factory| factory())
    }

    fn response_middleware(&self, identifier: &str) -> Option<Box<dyn ResponseMiddleware>> {
        self.response_middleware.get(identifier).map(|factory| factory())
    }

    fn item_processor(&self, identifier: &str) -> Option<Box<dyn ItemProcessor>> {
        self.item_processors.get(identifier).map(|factory| factory())
    }

    fn extension(&self, identifier: &str) -> Option<Box<dyn Extension>> {
        self.extensions.get(identifier).map(|factory| factory())
    }
}

/// A configured unit together with the reference it was built from.
pub struct ResolvedUnit<T: ?Sized> {
    pub name: String,
    pub options: Options,
    pub unit: Box<T>,
}

/// Resolves references through a [`Resolver`] and configures the result.
#[derive(Clone)]
pub struct ConfigurableResolver {
    resolver: Arc<dyn Resolver>,
}

impl ConfigurableResolver {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    pub fn resolve_downloader_middleware(
        &self,
        reference: &UnitReference,
    ) -> Result<ResolvedUnit<dyn DownloaderMiddleware>, SpiderError> {
        resolve(reference, UnitCategory::DownloaderMiddleware, |identifier| {
            self.resolver.downloader_middleware(identifier)
        })
    }

    pub fn resolve_response_middleware(
        &self,
        reference: &UnitReference,
    ) -> Result<ResolvedUnit<dyn ResponseMiddleware>, SpiderError> {
        resolve(reference, UnitCategory::ResponseMiddleware, |identifier| {
            self.resolver.response_middleware(identifier)
        })
    }

    pub fn resolve_item_processor(
        &self,
        reference: &UnitReference,
    ) -> Result<ResolvedUnit<dyn ItemProcessor>, SpiderError> {
        resolve(reference, UnitCategory::ItemProcessor, |identifier| {
            self.resolver.item_processor(identifier)
        })
    }

    pub fn resolve_extension(
        &self,
        reference: &UnitReference,
    ) -> Result<ResolvedUnit<dyn Extension>, SpiderError> {
        resolve(reference, UnitCategory::Extension, |identifier| {
            self.resolver.extension(identifier)
        })
    }
}

fn resolve<T, F>(
    reference: &UnitReference,
    category: UnitCategory,
    lookup: F,
) -> Result<ResolvedUnit<T>, SpiderError>
where
    T: Configurable + ?Sized,
    F: FnOnce(&str) -> Option<Box<T>>,
{
    let (identifier, options) = reference.to_parts();
    let mut unit = lookup(identifier).ok_or_else(|| SpiderError::UnresolvableUnit {
        category,
        identifier: identifier.to_string(),
    })?;

    unit.configure(options.clone()).map_err(|err| match err {
        SpiderError::InvalidConfiguration { reason, .. } => {
            SpiderError::invalid_configuration(identifier, reason)
        }
        other => SpiderError::invalid_configuration(identifier, other),
    })?;

    trace!("Resolved {} `{}`", category, identifier);
    Ok(ResolvedUnit {
        name: identifier.to_string(),
        options,
        unit,
    })
}
