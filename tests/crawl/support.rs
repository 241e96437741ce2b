//! In-memory transport, test spider and recording units shared by the crawl
//! tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use spider_run::prelude::*;
use spider_run::TransportFailure;
use tokio::time::Instant;
use url::Url;

/// Serves every url with an empty 200 page after `latency`.
#[derive(Default)]
pub struct MockDownloader {
    latency: Duration,
    slow: Mutex<HashMap<String, Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    dispatched: Mutex<Vec<Instant>>,
    fetched: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, usize>>,
}

impl MockDownloader {
    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Default::default()
        })
    }

    /// Makes the next `times` fetches of `url` fail.
    pub fn fail(&self, url: &str, times: usize) {
        self.failures.lock().insert(url.to_string(), times);
    }

    /// Serves `url` after `latency` instead of the default latency.
    pub fn slow(&self, url: &str, latency: Duration) {
        self.slow.lock().insert(url.to_string(), latency);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn dispatched(&self) -> Vec<Instant> {
        self.dispatched.lock().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn fetch(&self, request: Arc<Request>) -> Result<Response, TransportFailure> {
        self.dispatched.lock().push(Instant::now());
        self.fetched.lock().push(request.url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self
            .slow
            .lock()
            .get(request.url.as_str())
            .copied()
            .unwrap_or(self.latency);
        tokio::time::sleep(latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(remaining) = self.failures.lock().get_mut(request.url.as_str()) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportFailure::new("connection reset by peer"));
            }
        }
        Ok(Response::new(
            request,
            StatusCode::OK,
            HeaderMap::new(),
            "<html></html>",
        ))
    }
}

pub struct TestSpider {
    pub configuration: PipelineDescription,
    pub seeds: Vec<String>,
}

impl TestSpider {
    pub fn new(configuration: PipelineDescription, seeds: &[&str]) -> Self {
        Self {
            configuration,
            seeds: seeds.iter().map(|seed| seed.to_string()).collect(),
        }
    }
}

impl Spider for TestSpider {
    fn name(&self) -> &str {
        "test-spider"
    }

    fn load_configuration(&self) -> PipelineDescription {
        self.configuration.clone()
    }

    fn with_configuration(&mut self, configuration: PipelineDescription) {
        self.configuration = configuration;
    }

    fn start_urls(&self) -> Vec<&str> {
        self.seeds.iter().map(String::as_str).collect()
    }
}

/// Emits one item per response and `links` follow-ups below its url.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkExtractor {
    links: usize,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self { links: 2 }
    }
}

impl Configurable for LinkExtractor {
    fn configure(&mut self, options: Options) -> Result<(), SpiderError> {
        *self = parse_options(options)?;
        Ok(())
    }
}

#[async_trait]
impl ResponseMiddleware for LinkExtractor {
    async fn handle_response(
        &self,
        response: Response,
        output: &mut ParseOutput,
    ) -> Result<Outcome<Response>, SpiderError> {
        output.add_item(Item::new().with("url", response.url.as_str()));
        let base = response.url.as_str().trim_end_matches('/');
        for index in 0..self.links {
            let url = Url::parse(&format!("{base}/{index}"))?;
            output.add_request(response.request().follow(url));
        }
        Ok(Outcome::Kept(response))
    }
}

/// Drops requests whose path contains `blocked`.
#[derive(Debug, Default)]
pub struct BlockList;

impl Configurable for BlockList {}

#[async_trait]
impl DownloaderMiddleware for BlockList {
    async fn handle_request(&self, request: Request) -> Result<Outcome<Request>, SpiderError> {
        if request.url.path().contains("blocked") {
            return Ok(Outcome::dropped("blocked path"));
        }
        Ok(Outcome::Kept(request))
    }
}

/// Fails on `/bad` and panics on `/panic`.
#[derive(Debug, Default)]
pub struct Faulty;

impl Configurable for Faulty {}

#[async_trait]
impl ResponseMiddleware for Faulty {
    async fn handle_response(
        &self,
        response: Response,
        _output: &mut ParseOutput,
    ) -> Result<Outcome<Response>, SpiderError> {
        match response.url.path() {
            "/bad" => Err(SpiderError::GeneralError("malformed page".to_string())),
            "/panic" => panic!("extraction blew up"),
            _ => Ok(Outcome::Kept(response)),
        }
    }
}

/// Records the items it sees, then keeps them.
#[derive(Clone, Default)]
pub struct ItemRecorder {
    pub seen: Arc<Mutex<Vec<Item>>>,
    pub closed: Arc<AtomicBool>,
}

impl Configurable for ItemRecorder {}

#[async_trait]
impl ItemProcessor for ItemRecorder {
    async fn process_item(&self, item: Item) -> Result<Outcome<Item>, SpiderError> {
        self.seen.lock().push(item.clone());
        Ok(Outcome::Kept(item))
    }

    async fn close(&self) -> Result<(), SpiderError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DropEverything;

impl Configurable for DropEverything {}

#[async_trait]
impl ItemProcessor for DropEverything {
    async fn process_item(&self, _item: Item) -> Result<Outcome<Item>, SpiderError> {
        Ok(Outcome::dropped("not wanted"))
    }
}

#[derive(Debug, Default)]
pub struct PanickingProcessor;

impl Configurable for PanickingProcessor {}

#[async_trait]
impl ItemProcessor for PanickingProcessor {
    async fn process_item(&self, _item: Item) -> Result<Outcome<Item>, SpiderError> {
        panic!("processor blew up")
    }
}

/// Holds up delivery of the first `RequestSending` event by `STALL`.
#[derive(Clone, Default)]
pub struct StallFirstSend {
    stalled: Arc<AtomicBool>,
}

impl StallFirstSend {
    pub const STALL: Duration = Duration::from_millis(150);
}

impl Configurable for StallFirstSend {}

#[async_trait]
impl Extension for StallFirstSend {
    fn subscribed_events(&self) -> Vec<EventKind> {
        vec![EventKind::RequestSending]
    }

    async fn handle_event(&self, _run: &RunInfo, _event: &Event) -> Result<(), SpiderError> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Self::STALL).await;
        }
        Ok(())
    }
}

/// Records every event it receives.
#[derive(Clone, Default)]
pub struct EventRecorder {
    pub events: Arc<Mutex<Vec<Event>>>,
}

impl EventRecorder {
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(Event::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl Configurable for EventRecorder {}

#[async_trait]
impl Extension for EventRecorder {
    async fn handle_event(&self, run: &RunInfo, event: &Event) -> Result<(), SpiderError> {
        assert_eq!(run.spider, "test-spider");
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Registry with the built-ins plus the test units above.
///
/// Recorders are shared: every instance the registry builds writes into the
/// same buffers as the returned handles.
pub struct TestRegistry {
    pub registry: Registry,
    pub first: ItemRecorder,
    pub second: ItemRecorder,
    pub events: EventRecorder,
}

impl TestRegistry {
    pub fn new() -> Self {
        let first = ItemRecorder::default();
        let second = ItemRecorder::default();
        let events = EventRecorder::default();

        let mut registry = Registry::with_builtins();
        registry
            .register_response_middleware("link-extractor", LinkExtractor::default)
            .register_response_middleware("faulty", Faulty::default)
            .register_downloader_middleware("block-list", BlockList::default)
            .register_item_processor("drop-everything", DropEverything::default)
            .register_item_processor("panicking-processor", PanickingProcessor::default)
            .register_extension("stall-first-send", StallFirstSend::default)
            .register_item_processor("first-recorder", {
                let first = first.clone();
                move || first.clone()
            })
            .register_item_processor("second-recorder", {
                let second = second.clone();
                move || second.clone()
            })
            .register_extension("event-recorder", {
                let events = events.clone();
                move || events.clone()
            });

        Self {
            registry,
            first,
            second,
            events,
        }
    }

    pub fn assembler(&self) -> PipelineAssembler {
        PipelineAssembler::new(Arc::new(self.registry.clone()))
    }
}

/// Assembles and runs `spider` against `downloader`.
pub async fn run(
    registry: &TestRegistry,
    spider: &mut TestSpider,
    downloader: &Arc<MockDownloader>,
) -> RunResult {
    let plan = registry
        .assembler()
        .build(spider, None)
        .expect("plan should assemble");
    let downloader: Arc<dyn Downloader> = Arc::clone(downloader) as Arc<dyn Downloader>;
    Crawler::with_shared_downloader(plan, downloader)
        .start_crawl()
        .await
}

pub fn description(configure: impl FnOnce(&mut PipelineDescription)) -> PipelineDescription {
    let mut description = PipelineDescription {
        concurrency: 1,
        request_delay: Duration::ZERO,
        ..Default::default()
    };
    configure(&mut description);
    description
}
