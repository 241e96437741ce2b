//! Plan assembly from spiders and serialized overrides.

use std::time::Duration;

use serde_json::json;
use spider_run::prelude::*;
use spider_run::UnitCategory;

use super::support::{description, MockDownloader, TestRegistry, TestSpider};

#[test]
fn unresolvable_downloader_middleware_fails_before_fetching() {
    let registry = TestRegistry::new();
    let downloader = MockDownloader::with_latency(Duration::ZERO);
    let mut spider = TestSpider::new(
        description(|d| {
            d.downloader_middleware = vec!["user-agent".into(), "proxy-rotation".into()];
        }),
        &["https://example.com/"],
    );

    let err = registry.assembler().build(&mut spider, None).unwrap_err();

    match err {
        SpiderError::UnresolvableUnit {
            category,
            identifier,
        } => {
            assert_eq!(category, UnitCategory::DownloaderMiddleware);
            assert_eq!(identifier, "proxy-rotation");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(downloader.fetched().is_empty());
}

#[test]
fn invalid_options_name_the_unit() {
    let registry = TestRegistry::new();
    let mut spider = TestSpider::new(
        description(|d| {
            d.response_middleware = vec![UnitReference::try_from((
                "max-crawl-depth",
                json!({"max_depth": 2}),
            ))
            .unwrap()];
        }),
        &[],
    );

    match registry.assembler().build(&mut spider, None) {
        Err(SpiderError::InvalidConfiguration { identifier, .. }) => {
            assert_eq!(identifier, "max-crawl-depth")
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn serialized_overrides_replace_declared_fields() {
    let registry = TestRegistry::new();
    let mut spider = TestSpider::new(
        description(|d| {
            d.downloader_middleware = vec!["user-agent".into()];
            d.extensions = vec!["logger".into()];
        }),
        &["https://example.com/"],
    );
    let overrides: Overrides = serde_json::from_value(json!({
        "downloader_middleware": [
            "request-deduplication",
            ["retry", {"max_retries": 5}]
        ],
        "concurrency": 6,
        "request_delay_ms": 50
    }))
    .unwrap();

    let plan = registry.assembler().build(&mut spider, Some(&overrides)).unwrap();

    let names: Vec<&str> = plan
        .downloader_middleware()
        .iter()
        .map(|adapter| adapter.name())
        .collect();
    assert_eq!(names, vec!["request-deduplication", "retry"]);
    assert_eq!(plan.downloader_middleware()[1].options()["max_retries"], json!(5));
    assert_eq!(plan.extensions()[0].name(), "logger");
    assert_eq!(plan.concurrency(), 6);
    assert_eq!(plan.request_delay(), Duration::from_millis(50));
    // the spider keeps the effective description
    assert_eq!(&spider.configuration, plan.configuration());
}
