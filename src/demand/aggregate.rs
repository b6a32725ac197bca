//! Daily rollup with positional diminishing returns and the calendar bonus.

use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::demand::calendar::calendar_bonus;
use crate::ingest::types::DateRange;
use crate::model::{CanonicalEvent, DailyDemand, DemandLevel};

/// Weight by rank; every rank past the table uses the last entry.
pub const POSITION_WEIGHTS: [f64; 4] = [1.0, 0.7, 0.5, 0.3];

pub fn position_weight(rank: usize) -> f64 {
    POSITION_WEIGHTS[rank.min(POSITION_WEIGHTS.len() - 1)]
}

/// Roll up one date. Cancelled events are ignored; the rest are sorted by
/// descending impact (ties keep input order).
pub fn aggregate_day(date: NaiveDate, events: &[CanonicalEvent]) -> DailyDemand {
    let mut active: Vec<CanonicalEvent> =
        events.iter().filter(|e| e.is_active()).cloned().collect();
    active.sort_by_key(|e| Reverse(e.demand_impact_score));

    let weighted: f64 = active
        .iter()
        .enumerate()
        .map(|(rank, e)| e.demand_impact_score as f64 * position_weight(rank))
        .sum();
    let event_score = weighted.round() as u32;

    let bonus = calendar_bonus(date);
    let calendar_bonus = bonus.map(|b| b.bonus).unwrap_or(0);
    let total_score = event_score + calendar_bonus;

    DailyDemand {
        date,
        event_score,
        calendar_bonus,
        calendar_label: bonus.map(|b| b.label.to_string()),
        total_score,
        event_count: active.len(),
        demand_level: DemandLevel::from_score(total_score),
        events: active,
    }
}

/// One `DailyDemand` per date in `range`, grouping events by start date.
/// Events outside the range are ignored.
pub fn aggregate_range(range: &DateRange, events: &[CanonicalEvent]) -> Vec<DailyDemand> {
    let mut by_date: BTreeMap<NaiveDate, Vec<CanonicalEvent>> = BTreeMap::new();
    for ev in events {
        if let Some(date) = ev.event.start_date.filter(|d| range.contains(*d)) {
            by_date.entry(date).or_default().push(ev.clone());
        }
    }

    range
        .days()
        .map(|date| {
            let day_events = by_date.remove(&date).unwrap_or_default();
            let daily = aggregate_day(date, &day_events);
            tracing::debug!(
                target: "demand",
                date = %date,
                events = daily.event_count,
                score = daily.total_score,
                level = daily.demand_level.as_str(),
                "daily demand"
            );
            daily
        })
        .collect()
}
