//! Concurrency bound and dispatch spacing.

use std::time::Duration;

use spider_run::prelude::*;

use super::support::{description, run, MockDownloader, TestRegistry, TestSpider};

fn seeds(count: usize) -> Vec<String> {
    (0..count)
        .map(|index| format!("https://example.com/page/{index}"))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn never_exceeds_concurrency() {
    for concurrency in [1, 3, 5] {
        let registry = TestRegistry::new();
        let downloader = MockDownloader::with_latency(Duration::from_millis(50));
        let urls = seeds(12);
        let seed_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let mut spider = TestSpider::new(
            description(|d| d.concurrency = concurrency),
            &seed_refs,
        );

        let result = run(&registry, &mut spider, &downloader).await;

        assert_eq!(result.requests_issued, 12);
        assert!(
            downloader.max_in_flight() <= concurrency,
            "{} fetches in flight with concurrency {}",
            downloader.max_in_flight(),
            concurrency
        );
        assert!(downloader.max_in_flight() >= 1);
    }
}

#[tokio::test(start_paused = true)]
async fn slot_covers_response_processing() {
    // two responses fan out into items; with one slot their fetches never overlap
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::from_millis(20));
    let mut spider = TestSpider::new(
        description(|d| {
            d.response_middleware = vec![UnitReference::try_from((
                "link-extractor",
                serde_json::json!({"links": 0}),
            ))
            .unwrap()];
            d.item_processors = vec!["first-recorder".into()];
        }),
        &["https://example.com/a", "https://example.com/b"],
    );

    let result = run(&registry, &mut spider, &downloader).await;

    assert_eq!(downloader.max_in_flight(), 1);
    assert_eq!(result.items_kept, 2);
}

#[tokio::test(start_paused = true)]
async fn dispatches_respect_request_delay() {
    let delay = Duration::from_millis(200);
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::from_millis(10));
    let urls = seeds(5);
    let seed_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let mut spider = TestSpider::new(
        description(|d| {
            d.concurrency = 4;
            d.request_delay = delay;
        }),
        &seed_refs,
    );

    run(&registry, &mut spider, &downloader).await;

    let mut dispatched = downloader.dispatched();
    assert_eq!(dispatched.len(), 5);
    dispatched.sort();
    for pair in dispatched.windows(2) {
        assert!(
            pair[1] - pair[0] >= delay,
            "dispatches only {:?} apart",
            pair[1] - pair[0]
        );
    }
}

#[tokio::test(start_paused = true)]
async fn delay_is_measured_from_dispatch_start() {
    // fetches slower than the delay: with enough slots they overlap
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::from_millis(500));
    let mut spider = TestSpider::new(
        description(|d| {
            d.concurrency = 2;
            d.request_delay = Duration::from_millis(100);
        }),
        &["https://example.com/a", "https://example.com/b"],
    );

    run(&registry, &mut spider, &downloader).await;

    let dispatched = downloader.dispatched();
    assert_eq!(downloader.max_in_flight(), 2);
    assert!(dispatched[1] - dispatched[0] < Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn slow_extension_does_not_shorten_fetch_spacing() {
    // the first RequestSending delivery stalls for less than the delay
    let delay = Duration::from_millis(200);
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::from_millis(10));
    let mut spider = TestSpider::new(
        description(|d| {
            d.concurrency = 2;
            d.request_delay = delay;
            d.extensions = vec!["stall-first-send".into()];
        }),
        &["https://example.com/a", "https://example.com/b"],
    );

    run(&registry, &mut spider, &downloader).await;

    let mut dispatched = downloader.dispatched();
    assert_eq!(dispatched.len(), 2);
    dispatched.sort();
    assert!(
        dispatched[1] - dispatched[0] >= delay,
        "fetches only {:?} apart",
        dispatched[1] - dispatched[0]
    );
}
