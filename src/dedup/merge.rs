//! Merge resolver: collapse one cluster into a `CanonicalEvent`.
//!
//! Members are ordered by source priority (stable, so ties keep input
//! order). The top member is the base record. Optional fields are then an
//! ordered coalesce over that list: the first informative value wins.
//! Named exceptions:
//! - attendance: maximum observed value
//! - confidence: maximum observed value
//! - demand metrics: key-by-key merge, lower-priority members overwrite on
//!   key collision

use std::cmp::Reverse;

use crate::model::{CandidateEvent, CanonicalEvent, DemandMetrics, Venue};

/// Higher wins. Names not listed rank 0.
pub const SOURCE_PRIORITY: [(&str, u8); 6] = [
    ("predicthq", 4),
    ("ticketmaster", 3),
    ("seatgeek", 2),
    ("memphis_travel", 1),
    ("memphis_tourism", 1),
    ("downtown_memphis", 1),
];

pub fn source_priority(source_name: &str) -> u8 {
    SOURCE_PRIORITY
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(source_name.trim()))
        .map(|(_, p)| *p)
        .unwrap_or(0)
}

/// Whether a value carries information worth keeping over an absent one.
trait Informative {
    fn is_informative(&self) -> bool;
}

impl Informative for String {
    fn is_informative(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Informative for i64 {
    fn is_informative(&self) -> bool {
        *self > 0
    }
}

impl Informative for f64 {
    fn is_informative(&self) -> bool {
        self.is_finite() && *self > 0.0
    }
}

impl Informative for Venue {
    fn is_informative(&self) -> bool {
        true
    }
}

/// First informative value in priority order; falls back to the base's own
/// value so an uninformative base field is never replaced by nothing.
fn coalesce<T, F>(ordered: &[&CandidateEvent], field: F) -> Option<T>
where
    T: Informative + Clone,
    F: Fn(&CandidateEvent) -> &Option<T>,
{
    ordered
        .iter()
        .filter_map(|ev| field(*ev).as_ref())
        .find(|v| v.is_informative())
        .or_else(|| ordered.first().and_then(|base| field(*base).as_ref()))
        .cloned()
}

fn max_attendance(ordered: &[&CandidateEvent]) -> Option<i64> {
    ordered
        .iter()
        .filter_map(|ev| ev.expected_attendance)
        .filter(|a| a.is_informative())
        .max()
        .or_else(|| ordered.first().and_then(|base| base.expected_attendance))
}

fn max_confidence(ordered: &[&CandidateEvent]) -> f64 {
    ordered
        .iter()
        .map(|ev| ev.confidence_score)
        .filter(|c| c.is_finite())
        .fold(0.0, f64::max)
}

fn merged_metrics(ordered: &[&CandidateEvent]) -> Option<DemandMetrics> {
    ordered
        .iter()
        .filter_map(|ev| ev.demand_metrics.as_ref())
        .fold(None, |acc: Option<DemandMetrics>, m| {
            let mut merged = acc.unwrap_or_default();
            merged.merge_from(m);
            Some(merged)
        })
}

/// Collapse a cluster. `None` only for an empty cluster.
pub fn merge_cluster(cluster: &[CandidateEvent]) -> Option<CanonicalEvent> {
    let mut ordered: Vec<&CandidateEvent> = cluster.iter().collect();
    ordered.sort_by_key(|ev| Reverse(source_priority(&ev.source.source_name)));
    let base = *ordered.first()?;

    let mut event = base.clone();
    if cluster.len() > 1 {
        event.description = coalesce(&ordered, |e| &e.description);
        event.ticket_price_min = coalesce(&ordered, |e| &e.ticket_price_min);
        event.ticket_price_max = coalesce(&ordered, |e| &e.ticket_price_max);
        event.image_url = coalesce(&ordered, |e| &e.image_url);
        event.event_url = coalesce(&ordered, |e| &e.event_url);
        event.venue = coalesce(&ordered, |e| &e.venue);
        event.expected_attendance = max_attendance(&ordered);
        event.confidence_score = max_confidence(&ordered);
        event.demand_metrics = merged_metrics(&ordered);
    }

    Some(CanonicalEvent {
        event,
        sources: cluster.to_vec(),
        demand_impact_score: 0,
    })
}
