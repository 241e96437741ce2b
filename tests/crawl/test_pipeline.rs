//! Drop semantics, event delivery and stage error isolation.

use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use spider_run::prelude::*;

use super::support::{description, run, MockDownloader, TestRegistry, TestSpider};

fn single_item_extraction() -> UnitReference {
    UnitReference::try_from(("link-extractor", json!({"links": 0}))).unwrap()
}

#[tokio::test]
async fn dropped_request_never_reaches_transport() {
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::ZERO);
    let mut spider = TestSpider::new(
        description(|d| {
            d.downloader_middleware = vec!["block-list".into()];
            d.extensions = vec!["event-recorder".into()];
        }),
        &["https://example.com/open", "https://example.com/blocked"],
    );

    let result = run(&registry, &mut spider, &downloader).await;

    assert_eq!(downloader.fetched(), vec!["https://example.com/open"]);
    assert_eq!(result.requests_issued, 1);
    assert_eq!(result.requests_dropped, 1);
    assert_eq!(registry.events.count(EventKind::RequestDropped), 1);
    assert_eq!(registry.events.count(EventKind::RequestSending), 1);

    let events = registry.events.events.lock();
    let dropped = events
        .iter()
        .find_map(|event| match event {
            Event::RequestDropped { request, reason } => Some((request.url.path().to_string(), reason.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(dropped.0, "/blocked");
    assert!(dropped.1.contains("block-list"));
}

#[tokio::test]
async fn item_dropped_by_a_processor_skips_the_rest() {
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::ZERO);
    let mut spider = TestSpider::new(
        description(|d| {
            d.response_middleware = vec![single_item_extraction()];
            d.item_processors = vec![
                "first-recorder".into(),
                "drop-everything".into(),
                "second-recorder".into(),
            ];
            d.extensions = vec!["event-recorder".into()];
        }),
        &["https://example.com/"],
    );

    let result = run(&registry, &mut spider, &downloader).await;

    assert_eq!(registry.first.seen.lock().len(), 1);
    assert!(registry.second.seen.lock().is_empty());
    assert_eq!(registry.events.count(EventKind::ItemExtracted), 1);
    assert_eq!(registry.events.count(EventKind::ItemDropped), 1);
    assert_eq!(registry.events.count(EventKind::ItemProcessed), 0);
    assert_eq!(result.items_extracted, 1);
    assert_eq!(result.items_dropped, 1);
    assert_eq!(result.items_kept, 0);
}

#[tokio::test]
async fn kept_items_reach_every_processor_in_order() {
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::ZERO);
    let mut spider = TestSpider::new(
        description(|d| {
            d.response_middleware = vec![single_item_extraction()];
            d.item_processors = vec!["first-recorder".into(), "second-recorder".into()];
            d.extensions = vec!["event-recorder".into()];
        }),
        &["https://example.com/a", "https://example.com/b"],
    );

    let result = run(&registry, &mut spider, &downloader).await;

    assert_eq!(result.items_kept, 2);
    assert_eq!(registry.second.seen.lock().len(), 2);
    assert_eq!(
        registry.second.seen.lock()[0].get_str("url"),
        Some("https://example.com/a")
    );
    assert_eq!(registry.events.count(EventKind::ItemProcessed), 2);
    assert!(registry.first.closed.load(Ordering::SeqCst));
    assert!(registry.second.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn run_events_frame_the_run() {
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::ZERO);
    let mut spider = TestSpider::new(
        description(|d| d.extensions = vec!["event-recorder".into()]),
        &["https://example.com/"],
    );

    let result = run(&registry, &mut spider, &downloader).await;

    let kinds = registry.events.kinds();
    assert_eq!(
        kinds,
        vec![
            EventKind::RunStarted,
            EventKind::RequestScheduled,
            EventKind::RequestSending,
            EventKind::ResponseReceived,
            EventKind::RunFinished,
        ]
    );
    match registry.events.events.lock().last() {
        Some(Event::RunFinished { result: reported }) => assert_eq!(reported, &result),
        other => panic!("unexpected last event: {other:?}"),
    };
}

#[tokio::test]
async fn stage_errors_are_isolated_to_their_request() {
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::ZERO);
    let mut spider = TestSpider::new(
        description(|d| {
            d.concurrency = 3;
            d.response_middleware = vec!["faulty".into(), single_item_extraction()];
            d.item_processors = vec!["first-recorder".into()];
            d.extensions = vec!["event-recorder".into()];
        }),
        &[
            "https://example.com/good",
            "https://example.com/bad",
            "https://example.com/panic",
        ],
    );

    let result = run(&registry, &mut spider, &downloader).await;

    assert_eq!(result.requests_issued, 3);
    assert_eq!(result.stage_errors, 2);
    assert_eq!(result.responses_dropped, 2);
    assert_eq!(result.items_kept, 1);
    assert_eq!(
        registry.first.seen.lock()[0].get_str("url"),
        Some("https://example.com/good")
    );
    assert_eq!(registry.events.count(EventKind::ResponseDropped), 2);
    assert_eq!(registry.events.count(EventKind::RunFinished), 1);
}

#[tokio::test]
async fn panicking_processor_drops_the_item() {
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::ZERO);
    let mut spider = TestSpider::new(
        description(|d| {
            d.response_middleware = vec![single_item_extraction()];
            d.item_processors = vec!["panicking-processor".into(), "second-recorder".into()];
            d.extensions = vec!["event-recorder".into()];
        }),
        &["https://example.com/a", "https://example.com/b"],
    );

    let result = run(&registry, &mut spider, &downloader).await;

    assert_eq!(result.items_extracted, 2);
    assert_eq!(result.items_dropped, 2);
    assert_eq!(result.items_kept, 0);
    assert_eq!(result.stage_errors, 2);
    assert!(registry.second.seen.lock().is_empty());
    assert_eq!(registry.events.count(EventKind::ItemExtracted), 2);
    assert_eq!(registry.events.count(EventKind::ItemDropped), 2);
    assert_eq!(registry.events.count(EventKind::ItemProcessed), 0);
    match registry.events.events.lock().iter().find(|e| e.kind() == EventKind::ItemDropped) {
        Some(Event::ItemDropped { reason, .. }) => {
            assert_eq!(reason, "stage `panicking-processor` failed: panicked")
        }
        other => panic!("unexpected event: {other:?}"),
    };
}
