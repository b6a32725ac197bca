// src/ingest/mod.rs
//! Source fan-out: one task per adapter, per-source error capture, and
//! candidate validation before deduplication.

pub mod providers;
pub mod types;

use crate::config::FetchOptions;
use crate::error::SourceError;
use crate::ingest::types::{DateRange, Pagination, SourceAdapter};
use crate::model::CandidateEvent;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_candidates_total",
            "Candidates accepted from source adapters."
        );
        describe_counter!(
            "ingest_skipped_total",
            "Malformed candidates dropped before deduplication."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetch failures (auth, rate limit, parse, timeout)."
        );
        describe_histogram!("ingest_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_counter!("dedup_clusters_total", "Clusters produced by deduplication.");
        describe_counter!(
            "dedup_duplicates_total",
            "Candidates folded into another record."
        );
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last ran."
        );
    });
}

static RE_NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, keep ASCII letters/digits/whitespace, collapse whitespace.
/// Idempotent.
pub fn normalize_title(s: &str) -> String {
    let lower = s.to_lowercase();
    let stripped = RE_NON_ALNUM.replace_all(&lower, "");
    RE_WS.replace_all(&stripped, " ").trim().to_string()
}

/// Outcome of one source's fetch, kept for the sync summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub fetched: usize,
    pub skipped: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Valid candidates from every source that succeeded, in adapter order.
    pub candidates: Vec<CandidateEvent>,
    pub reports: Vec<SourceReport>,
}

impl FetchOutcome {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| !r.is_ok())
    }
}

/// Normalize a batch from one source and drop malformed records.
/// Returns (kept, skipped_count).
pub fn validate_candidates(
    source_name: &str,
    raw: Vec<CandidateEvent>,
) -> (Vec<CandidateEvent>, usize) {
    let mut skipped = 0usize;
    let mut kept = Vec::with_capacity(raw.len());
    for mut ev in raw {
        if ev.start_date.is_none() {
            tracing::debug!(
                target: "ingest",
                source = source_name,
                title = %ev.title,
                "skipping candidate without start date"
            );
            skipped += 1;
            continue;
        }
        ev.normalized_title = normalize_title(&ev.title);
        if ev.source.source_name.trim().is_empty() {
            ev.source.source_name = source_name.to_string();
        }
        ev.confidence_score = if ev.confidence_score.is_finite() {
            ev.confidence_score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        kept.push(ev);
    }
    (kept, skipped)
}

/// Pull pages from one adapter until it reports no more or `max_pages` is hit.
pub async fn fetch_paginated(
    adapter: &dyn SourceAdapter,
    range: &DateRange,
    opts: &FetchOptions,
) -> Result<Vec<CandidateEvent>, SourceError> {
    let mut out = Vec::new();
    let mut page = Pagination::first(opts.page_size.max(1));
    for n in 0..opts.max_pages.max(1) {
        let mut result = adapter.fetch(range, page).await?;
        out.append(&mut result.events);
        if !result.has_more {
            break;
        }
        page = page.next();
        if n + 1 < opts.max_pages && !opts.page_delay().is_zero() {
            tokio::time::sleep(opts.page_delay()).await;
        }
    }
    Ok(out)
}

/// Fetch every adapter concurrently. A failing, panicking or slow source is
/// logged and contributes nothing; it never aborts its siblings.
pub async fn fetch_all_sources(
    adapters: &[Arc<dyn SourceAdapter>],
    range: DateRange,
    opts: FetchOptions,
) -> FetchOutcome {
    ensure_metrics_described();

    let handles: Vec<_> = adapters
        .iter()
        .map(|adapter| {
            let adapter = Arc::clone(adapter);
            let name = adapter.name().to_string();
            let task = tokio::spawn(async move {
                let t0 = Instant::now();
                let result = match tokio::time::timeout(
                    opts.timeout(),
                    fetch_paginated(adapter.as_ref(), &range, &opts),
                )
                .await
                {
                    Ok(r) => r,
                    Err(_) => Err(SourceError::Timeout {
                        source_name: adapter.name().to_string(),
                        timeout: opts.timeout(),
                    }),
                };
                (result, t0.elapsed())
            });
            (name, task)
        })
        .collect();

    let mut outcome = FetchOutcome::default();
    for (name, handle) in handles {
        let (result, elapsed) = match handle.await {
            Ok(settled) => settled,
            Err(join_err) => (
                Err(SourceError::Panicked {
                    source_name: name.clone(),
                    message: join_err.to_string(),
                }),
                std::time::Duration::ZERO,
            ),
        };
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        histogram!("ingest_fetch_ms", "source" => name.clone()).record(elapsed_ms as f64);

        match result {
            Ok(raw) => {
                let fetched = raw.len();
                let (kept, skipped) = validate_candidates(&name, raw);
                counter!("ingest_candidates_total", "source" => name.clone())
                    .increment(kept.len() as u64);
                counter!("ingest_skipped_total", "source" => name.clone())
                    .increment(skipped as u64);
                tracing::info!(
                    target: "ingest",
                    source = %name,
                    fetched,
                    skipped,
                    elapsed_ms,
                    "source fetched"
                );
                outcome.candidates.extend(kept);
                outcome.reports.push(SourceReport {
                    source: name,
                    fetched,
                    skipped,
                    elapsed_ms,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    source = %name,
                    kind = e.kind(),
                    error = %e,
                    "source fetch failed; excluded from this run"
                );
                counter!("ingest_source_errors_total", "source" => name.clone(), "kind" => e.kind())
                    .increment(1);
                outcome.reports.push(SourceReport {
                    source: name,
                    fetched: 0,
                    skipped: 0,
                    elapsed_ms,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    outcome
}
