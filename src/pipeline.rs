// src/pipeline.rs
//! Orchestration: fetch every enabled source → deduplicate → score →
//! one `DailyDemand` and one `PriceSuggestion` per date in range.

use metrics::gauge;
use serde::Serialize;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::dedup::{deduplicate_events, DedupStats};
use crate::demand::{aggregate_range, DemandScorer};
use crate::error::SettingsError;
use crate::ingest::types::{DateRange, SourceAdapter};
use crate::ingest::{ensure_metrics_described, fetch_all_sources, SourceReport};
use crate::model::{CandidateEvent, CanonicalEvent, DailyDemand, PriceSuggestion};
use crate::pricing::{suggest_price, HostSettings, RateOverrides};

/// Pure result of dedup + scoring + pricing over a candidate list.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub canonical_events: Vec<CanonicalEvent>,
    pub dedup_stats: DedupStats,
    pub daily: Vec<DailyDemand>,
    pub prices: Vec<PriceSuggestion>,
}

/// Everything one sync run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub range: DateRange,
    pub settings: HostSettings,
    pub sources: Vec<SourceReport>,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// Synchronous core. No I/O; safe to call repeatedly or in parallel.
pub fn evaluate(
    candidates: &[CandidateEvent],
    range: &DateRange,
    settings: &HostSettings,
    scorer: &DemandScorer,
) -> Evaluation {
    let dedup = deduplicate_events(candidates);
    let mut canonical_events = dedup.events;
    scorer.score_all(&mut canonical_events);

    let daily = aggregate_range(range, &canonical_events);
    let prices = daily.iter().map(|d| suggest_price(d, settings)).collect();

    Evaluation {
        canonical_events,
        dedup_stats: dedup.stats,
        daily,
        prices,
    }
}

pub struct Pipeline {
    config: EngineConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    scorer: DemandScorer,
}

impl Pipeline {
    pub fn new(config: EngineConfig) -> Self {
        let scorer = DemandScorer::new(config.downtown);
        Self {
            config,
            adapters: Vec::new(),
            scorer,
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Host property's distance from downtown, used for venues with no
    /// location.
    pub fn with_property_distance(mut self, miles: f64) -> Self {
        self.scorer = self.scorer.with_fallback_distance(miles);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Adapters allowed by `enabled_sources`, in registration order.
    pub fn active_adapters(&self) -> Vec<Arc<dyn SourceAdapter>> {
        self.adapters
            .iter()
            .filter(|a| self.config.is_source_enabled(a.name()))
            .cloned()
            .collect()
    }

    /// Full sync run. Only invalid host settings fail the run; source
    /// problems reduce the result set and show up in `sources`.
    pub async fn run(
        &self,
        range: DateRange,
        overrides: &RateOverrides,
    ) -> Result<PipelineOutput, SettingsError> {
        ensure_metrics_described();
        let settings = overrides.resolve(&self.config.default_rates)?;

        let adapters = self.active_adapters();
        let skipped = self.adapters.len() - adapters.len();
        if skipped > 0 {
            tracing::debug!(target: "pipeline", skipped, "adapters disabled by config");
        }

        let fetched = fetch_all_sources(&adapters, range, self.config.fetch).await;
        let failed = fetched.failed_sources().count();
        let evaluation = evaluate(&fetched.candidates, &range, &settings, &self.scorer);

        gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        tracing::info!(
            target: "pipeline",
            start = %range.start,
            end = %range.end,
            sources = adapters.len(),
            failed,
            candidates = fetched.candidates.len(),
            events = evaluation.canonical_events.len(),
            days = evaluation.daily.len(),
            "pipeline run complete"
        );

        Ok(PipelineOutput {
            range,
            settings,
            sources: fetched.reports,
            evaluation,
        })
    }
}
