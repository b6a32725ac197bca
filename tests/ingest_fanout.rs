// tests/ingest_fanout.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use event_demand_engine::config::FetchOptions;
use event_demand_engine::ingest::{fetch_all_sources, fetch_paginated};
use event_demand_engine::model::SourceRef;
use event_demand_engine::{
    CandidateEvent, DateRange, Pagination, SourceAdapter, SourceError, SourcePage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
    )
}

fn candidate(source: &str, id: usize) -> CandidateEvent {
    let mut e = CandidateEvent::new(format!("{source} show {id}"), SourceRef::new(source, id.to_string()));
    e.start_date = NaiveDate::from_ymd_opt(2025, 7, 1 + (id % 7) as u32);
    e
}

/// Claims there is always another page; counts how often it is asked.
struct EndlessAdapter {
    calls: AtomicUsize,
}

#[async_trait]
impl SourceAdapter for EndlessAdapter {
    async fn fetch(&self, _: &DateRange, page: Pagination) -> Result<SourcePage, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SourcePage {
            events: vec![candidate("endless", page.offset)],
            has_more: true,
        })
    }

    fn name(&self) -> &str {
        "endless"
    }
}

struct SlowAdapter;

#[async_trait]
impl SourceAdapter for SlowAdapter {
    async fn fetch(&self, _: &DateRange, _: Pagination) -> Result<SourcePage, SourceError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(SourcePage::last(vec![candidate("slow", 1)]))
    }

    fn name(&self) -> &str {
        "slow"
    }
}

struct PanickingAdapter;

#[async_trait]
impl SourceAdapter for PanickingAdapter {
    async fn fetch(&self, _: &DateRange, _: Pagination) -> Result<SourcePage, SourceError> {
        panic!("scraper blew up");
    }

    fn name(&self) -> &str {
        "panicky"
    }
}

struct RateLimitedAdapter;

#[async_trait]
impl SourceAdapter for RateLimitedAdapter {
    async fn fetch(&self, _: &DateRange, _: Pagination) -> Result<SourcePage, SourceError> {
        Err(SourceError::RateLimited {
            source_name: "predicthq".into(),
        })
    }

    fn name(&self) -> &str {
        "predicthq"
    }
}

struct SteadyAdapter;

#[async_trait]
impl SourceAdapter for SteadyAdapter {
    async fn fetch(&self, _: &DateRange, _: Pagination) -> Result<SourcePage, SourceError> {
        Ok(SourcePage::last(vec![
            candidate("ticketmaster", 1),
            candidate("ticketmaster", 2),
        ]))
    }

    fn name(&self) -> &str {
        "ticketmaster"
    }
}

#[tokio::test]
async fn pagination_stops_at_max_pages() {
    let adapter = EndlessAdapter {
        calls: AtomicUsize::new(0),
    };
    let opts = FetchOptions {
        max_pages: 3,
        page_size: 25,
        ..FetchOptions::immediate()
    };
    let events = fetch_paginated(&adapter, &range(), &opts).await.unwrap();
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
    let offsets: Vec<String> = events
        .iter()
        .filter_map(|e| e.source.source_event_id.clone())
        .collect();
    assert_eq!(offsets, vec!["0", "25", "50"]);
}

#[tokio::test(start_paused = true)]
async fn pages_are_spaced_by_the_configured_delay() {
    let adapter = EndlessAdapter {
        calls: AtomicUsize::new(0),
    };
    let opts = FetchOptions {
        max_pages: 3,
        page_delay_ms: 500,
        ..FetchOptions::default()
    };
    let t0 = tokio::time::Instant::now();
    fetch_paginated(&adapter, &range(), &opts).await.unwrap();
    // two gaps between three pages, none after the last
    let waited = t0.elapsed();
    assert!(waited >= Duration::from_millis(1000), "{waited:?}");
    assert!(waited < Duration::from_millis(1500), "{waited:?}");
}

#[tokio::test(start_paused = true)]
async fn failures_are_isolated_per_source() {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(RateLimitedAdapter),
        Arc::new(SlowAdapter),
        Arc::new(SteadyAdapter),
        Arc::new(PanickingAdapter),
    ];
    let out = fetch_all_sources(&adapters, range(), FetchOptions::immediate()).await;

    assert_eq!(out.candidates.len(), 2);
    assert!(out
        .candidates
        .iter()
        .all(|c| c.source.source_name == "ticketmaster"));

    let names: Vec<&str> = out.reports.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(names, vec!["predicthq", "slow", "ticketmaster", "panicky"]);

    let failed: Vec<&str> = out.failed_sources().map(|r| r.source.as_str()).collect();
    assert_eq!(failed, vec!["predicthq", "slow", "panicky"]);

    let err = |name: &str| {
        out.reports
            .iter()
            .find(|r| r.source == name)
            .and_then(|r| r.error.clone())
            .unwrap()
    };
    assert!(err("predicthq").contains("rate limit"));
    assert!(err("slow").contains("did not finish"));
    assert!(err("panicky").contains("aborted"));
}

#[tokio::test]
async fn no_adapters_means_empty_outcome() {
    let out = fetch_all_sources(&[], range(), FetchOptions::immediate()).await;
    assert!(out.candidates.is_empty());
    assert!(out.reports.is_empty());
}
