// src/dedup/mod.rs
//! Deduplication engine: blocking → pairwise similarity → greedy clustering
//! → priority merge. Pure and synchronous; safe to call repeatedly.

pub mod blocking;
pub mod cluster;
pub mod merge;
pub mod similarity;

use metrics::counter;
use serde::Serialize;

use crate::dedup::blocking::BlockingIndex;
use crate::dedup::cluster::{build_clusters, ProcessedIndex, DEFAULT_MERGE_THRESHOLD};
use crate::dedup::merge::merge_cluster;
use crate::ingest::ensure_metrics_described;
use crate::model::{CandidateEvent, CanonicalEvent};

pub use cluster::identity_key;
pub use merge::source_priority;
pub use similarity::similarity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    /// Candidates passed in.
    pub total: usize,
    /// Canonical events produced.
    pub unique: usize,
    /// `total - unique`.
    pub duplicates: usize,
    /// Clusters with more than one member.
    pub merged_clusters: usize,
    pub identity_collisions: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub events: Vec<CanonicalEvent>,
    pub stats: DedupStats,
}

/// Deduplicate with the default 0.75 merge threshold.
pub fn deduplicate_events(candidates: &[CandidateEvent]) -> DedupOutcome {
    deduplicate_with_threshold(candidates, DEFAULT_MERGE_THRESHOLD)
}

pub fn deduplicate_with_threshold(candidates: &[CandidateEvent], threshold: f64) -> DedupOutcome {
    ensure_metrics_described();

    let index = BlockingIndex::build(candidates);
    let mut processed = ProcessedIndex::default();
    let clustering = build_clusters(candidates, &index, threshold, &mut processed);

    let mut merged_clusters = 0usize;
    let events: Vec<CanonicalEvent> = clustering
        .clusters
        .iter()
        .filter_map(|members| {
            if members.len() > 1 {
                merged_clusters += 1;
            }
            let cluster: Vec<CandidateEvent> =
                members.iter().map(|&i| candidates[i].clone()).collect();
            merge_cluster(&cluster)
        })
        .collect();

    let stats = DedupStats {
        total: candidates.len(),
        unique: events.len(),
        duplicates: candidates.len().saturating_sub(events.len()),
        merged_clusters,
        identity_collisions: clustering.identity_collisions,
    };

    counter!("dedup_clusters_total").increment(stats.unique as u64);
    counter!("dedup_duplicates_total").increment(stats.duplicates as u64);
    if stats.identity_collisions > 0 {
        tracing::debug!(
            target: "dedup",
            collisions = stats.identity_collisions,
            "id-less candidates collapsed by identical serialization"
        );
    }
    tracing::info!(
        target: "dedup",
        total = stats.total,
        clusters = stats.unique,
        duplicates = stats.duplicates,
        blocks = index.len(),
        "deduplication complete"
    );

    DedupOutcome { events, stats }
}
