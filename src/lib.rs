// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dedup;
pub mod demand;
pub mod error;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod pricing;

// ---- Re-exports for stable public API ----
pub use crate::config::EngineConfig;
pub use crate::dedup::{deduplicate_events, DedupOutcome, DedupStats};
pub use crate::demand::DemandScorer;
pub use crate::error::{SettingsError, SourceError};
pub use crate::ingest::types::{DateRange, Pagination, SourceAdapter, SourcePage};
pub use crate::model::{
    CandidateEvent, CanonicalEvent, DailyDemand, DemandLevel, EventType, PriceSuggestion,
};
pub use crate::pipeline::{evaluate, Evaluation, Pipeline, PipelineOutput};
pub use crate::pricing::{suggest_price, HostSettings, RateOverrides};
