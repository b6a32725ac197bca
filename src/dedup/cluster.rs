//! Greedy per-block clustering with a global processed index.
//!
//! Identity is `sourceName:sourceEventId`; a candidate without an id falls
//! back to its full JSON serialization. Two distinct id-less records with
//! byte-identical fields therefore share one identity and the later one is
//! absorbed before similarity is ever computed. The number of absorbed
//! records is reported as `identity_collisions`.

use std::collections::HashMap;

use crate::dedup::blocking::BlockingIndex;
use crate::dedup::similarity::similarity;
use crate::model::CandidateEvent;

pub const DEFAULT_MERGE_THRESHOLD: f64 = 0.75;

pub fn identity_key(ev: &CandidateEvent) -> String {
    ev.source.key().unwrap_or_else(|| {
        serde_json::to_string(ev).unwrap_or_else(|_| format!("{ev:?}"))
    })
}

/// Identity key → processed flag, shared across every block of one run.
#[derive(Debug, Clone, Default)]
pub struct ProcessedIndex {
    flags: HashMap<String, bool>,
}

impl ProcessedIndex {
    pub fn is_processed(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn mark(&mut self, key: &str) {
        self.flags.insert(key.to_string(), true);
    }

    pub fn processed_count(&self) -> usize {
        self.flags.values().filter(|v| **v).count()
    }
}

/// Clusters as index lists into the candidate slice, plus collapse count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clustering {
    pub clusters: Vec<Vec<usize>>,
    /// Candidates never placed in a cluster because an earlier candidate
    /// already held the same identity key.
    pub identity_collisions: usize,
}

/// Walk every block in registration order. The first unprocessed member
/// seeds a cluster; every later unprocessed member scoring at or above
/// `threshold` against the seed joins it.
pub fn build_clusters(
    candidates: &[CandidateEvent],
    index: &BlockingIndex,
    threshold: f64,
    processed: &mut ProcessedIndex,
) -> Clustering {
    let keys: Vec<String> = candidates.iter().map(identity_key).collect();
    let mut clusters = Vec::new();

    for block in index.blocks() {
        for (pos, &seed) in block.members.iter().enumerate() {
            if processed.is_processed(&keys[seed]) {
                continue;
            }
            processed.mark(&keys[seed]);
            let mut cluster = vec![seed];

            for &other in &block.members[pos + 1..] {
                if processed.is_processed(&keys[other]) {
                    continue;
                }
                if similarity(&candidates[seed], &candidates[other]) >= threshold {
                    processed.mark(&keys[other]);
                    cluster.push(other);
                }
            }
            clusters.push(cluster);
        }
    }

    let placed: usize = clusters.iter().map(Vec::len).sum();
    Clustering {
        clusters,
        identity_collisions: candidates.len().saturating_sub(placed),
    }
}

/// Convenience: block, then cluster with a fresh processed index.
pub fn find_clusters(candidates: &[CandidateEvent], threshold: f64) -> Clustering {
    let index = BlockingIndex::build(candidates);
    let mut processed = ProcessedIndex::default();
    build_clusters(candidates, &index, threshold, &mut processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventType, SourceRef, Venue};
    use chrono::NaiveDate;

    fn ev(src: &str, id: Option<&str>, title: &str, date: &str) -> CandidateEvent {
        let mut e = CandidateEvent::new(
            title,
            SourceRef {
                source_name: src.into(),
                source_event_id: id.map(str::to_string),
            },
        );
        e.start_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok();
        e.event_type = Some(EventType::Concert);
        e.venue = Some(Venue {
            name: Some("Minglewood Hall".into()),
            latitude: Some(35.1370),
            longitude: Some(-89.9900),
            downtown_distance_miles: Some(3.4),
        });
        e
    }

    #[test]
    fn duplicates_across_adjacent_days_resolve_once() {
        let c = vec![
            ev("ticketmaster", Some("tm1"), "Khruangbin Live", "2025-04-11"),
            ev("seatgeek", Some("sg1"), "Khruangbin Live", "2025-04-12"),
            ev("seatgeek", Some("sg2"), "Snarky Puppy", "2025-04-11"),
        ];
        let out = find_clusters(&c, DEFAULT_MERGE_THRESHOLD);
        assert_eq!(out.clusters.len(), 2);
        assert_eq!(out.clusters[0], vec![0, 1]);
        assert_eq!(out.identity_collisions, 0);

        let mut all: Vec<usize> = out.clusters.concat();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2]);
    }

    #[test]
    fn dissimilar_events_in_one_block_stay_apart() {
        let mut far = ev("seatgeek", Some("sg9"), "Khruangbin Live", "2025-04-11");
        far.venue = Some(Venue {
            latitude: Some(36.16),
            longitude: Some(-86.78),
            ..Venue::default()
        });
        far.event_type = Some(EventType::Sports);
        far.title = "Khruangbin Livestream Watch Party Downtown".into();
        let c = vec![ev("ticketmaster", Some("tm1"), "Khruangbin Live", "2025-04-11"), far];
        let out = find_clusters(&c, DEFAULT_MERGE_THRESHOLD);
        assert_eq!(out.clusters.len(), 2);
    }

    #[test]
    fn idless_identical_records_collapse_by_identity() {
        let a = ev("downtown_memphis", None, "Art Walk", "2025-06-27");
        let out = find_clusters(&[a.clone(), a], DEFAULT_MERGE_THRESHOLD);
        assert_eq!(out.clusters, vec![vec![0]]);
        assert_eq!(out.identity_collisions, 1);
    }

    #[test]
    fn identity_prefers_source_key() {
        let e = ev("predicthq", Some("phq-7"), "Expo", "2025-01-05");
        assert_eq!(identity_key(&e), "predicthq:phq-7");
        let anon = ev("memphis_travel", None, "Expo", "2025-01-05");
        assert!(identity_key(&anon).starts_with('{'));
    }
}
