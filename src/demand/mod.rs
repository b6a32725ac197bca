// src/demand/mod.rs
//! Per-event demand impact (0–100) and the per-day rollup.
//!
//! impact = 0.35·attendance + 0.20·type + 0.20·proximity + 0.15·timing + 0.10·price
//!
//! Every component is clamped to [0,100] before weighting.

pub mod aggregate;
pub mod calendar;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

use crate::model::{CandidateEvent, CanonicalEvent, EventType, GeoPoint};

pub use aggregate::{aggregate_day, aggregate_range};
pub use calendar::{calendar_bonus, is_weekend, CalendarBonus};

pub const ATTENDANCE_WEIGHT: f64 = 0.35;
pub const TYPE_WEIGHT: f64 = 0.20;
pub const PROXIMITY_WEIGHT: f64 = 0.20;
pub const TIMING_WEIGHT: f64 = 0.15;
pub const PRICE_WEIGHT: f64 = 0.10;

const UNKNOWN_ATTENDANCE_SCORE: f64 = 30.0;
const UNKNOWN_DISTANCE_SCORE: f64 = 70.0;
const UNKNOWN_PRICE_SCORE: f64 = 50.0;
const TIMING_BASE: f64 = 50.0;

/// Attendance segments: (exclusive upper bound, floor score, slope, segment start).
/// Strictly increasing; each segment ends where the next begins.
const ATTENDANCE_SEGMENTS: [(f64, f64, f64, f64); 6] = [
    (500.0, 20.0, 0.025, 100.0),
    (1_000.0, 30.0, 0.02, 500.0),
    (5_000.0, 40.0, 0.005, 1_000.0),
    (10_000.0, 60.0, 0.004, 5_000.0),
    (50_000.0, 80.0, 0.000125, 10_000.0),
    (100_000.0, 85.0, 0.0003, 50_000.0),
];

const TYPE_SCORES: [(EventType, f64); 7] = [
    (EventType::Festival, 95.0),
    (EventType::Convention, 90.0),
    (EventType::Concert, 85.0),
    (EventType::Sports, 80.0),
    (EventType::Conference, 75.0),
    (EventType::Theater, 65.0),
    (EventType::Other, 50.0),
];

/// (exclusive miles bound, score); beyond the last → `FAR_DISTANCE_SCORE`.
const DISTANCE_STEPS: [(f64, f64); 5] = [
    (0.5, 100.0),
    (1.0, 90.0),
    (2.0, 75.0),
    (5.0, 50.0),
    (10.0, 25.0),
];
const FAR_DISTANCE_SCORE: f64 = 10.0;

/// Indexed by `Weekday::num_days_from_sunday`.
const DAY_FACTORS: [f64; 7] = [1.15, 0.85, 0.85, 0.90, 0.95, 1.20, 1.25];

/// (first hour, last hour inclusive, factor).
const HOUR_FACTORS: [(u32, u32, f64); 3] = [(19, 22, 1.15), (17, 18, 1.10), (10, 14, 1.05)];

/// (exclusive dollar bound, score); beyond the last → 100.
const PRICE_STEPS: [(f64, f64); 5] = [
    (25.0, 30.0),
    (50.0, 45.0),
    (100.0, 60.0),
    (200.0, 75.0),
    (500.0, 90.0),
];

pub fn attendance_score(attendance: Option<f64>) -> f64 {
    let a = match attendance.filter(|a| a.is_finite() && *a > 0.0) {
        Some(a) => a,
        None => return UNKNOWN_ATTENDANCE_SCORE,
    };
    if a < 100.0 {
        return (a / 5.0).max(10.0);
    }
    ATTENDANCE_SEGMENTS
        .iter()
        .find(|(upper, ..)| a < *upper)
        .map(|(_, floor, slope, start)| floor + (a - start) * slope)
        .unwrap_or(100.0)
        .clamp(0.0, 100.0)
}

pub fn type_score(event_type: Option<EventType>, local_rank: Option<f64>) -> f64 {
    let base = event_type
        .and_then(|t| TYPE_SCORES.iter().find(|(k, _)| *k == t))
        .map(|(_, s)| *s)
        .unwrap_or(50.0);
    match local_rank {
        Some(rank) => (base + rank.clamp(0.0, 100.0)) / 2.0,
        None => base,
    }
}

pub fn proximity_score(distance_miles: Option<f64>) -> f64 {
    let Some(d) = distance_miles.filter(|d| d.is_finite() && *d >= 0.0) else {
        return UNKNOWN_DISTANCE_SCORE;
    };
    DISTANCE_STEPS
        .iter()
        .find(|(bound, _)| d < *bound)
        .map(|(_, s)| *s)
        .unwrap_or(FAR_DISTANCE_SCORE)
}

pub fn timing_score(date: Option<NaiveDate>, start_time: Option<NaiveTime>) -> f64 {
    let day = date
        .map(|d| DAY_FACTORS[d.weekday().num_days_from_sunday() as usize])
        .unwrap_or(1.0);
    let hour = start_time
        .and_then(|t| {
            HOUR_FACTORS
                .iter()
                .find(|(from, to, _)| (*from..=*to).contains(&t.hour()))
        })
        .map(|(_, _, f)| *f)
        .unwrap_or(1.0);
    (TIMING_BASE * day * hour).min(100.0)
}

pub fn price_score(min: Option<f64>, max: Option<f64>) -> f64 {
    let valid = |p: Option<f64>| p.filter(|p| p.is_finite() && *p > 0.0);
    let avg = match (valid(min), valid(max)) {
        (Some(lo), Some(hi)) => (lo + hi) / 2.0,
        (Some(p), None) | (None, Some(p)) => p,
        (None, None) => return UNKNOWN_PRICE_SCORE,
    };
    PRICE_STEPS
        .iter()
        .find(|(bound, _)| avg < *bound)
        .map(|(_, s)| *s)
        .unwrap_or(100.0)
}

/// Component scores for one event, for debugging and display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactBreakdown {
    pub attendance: f64,
    pub event_type: f64,
    pub proximity: f64,
    pub timing: f64,
    pub price: f64,
    pub total: u32,
}

/// Scores events against a downtown reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandScorer {
    pub downtown: Option<GeoPoint>,
    /// Host property's distance from downtown, used when a venue gives none.
    pub fallback_distance_miles: Option<f64>,
}

impl Default for DemandScorer {
    fn default() -> Self {
        Self {
            downtown: Some(crate::config::DEFAULT_DOWNTOWN),
            fallback_distance_miles: None,
        }
    }
}

impl DemandScorer {
    pub fn new(downtown: GeoPoint) -> Self {
        Self {
            downtown: Some(downtown),
            fallback_distance_miles: None,
        }
    }

    pub fn with_fallback_distance(mut self, miles: f64) -> Self {
        self.fallback_distance_miles = Some(miles);
        self
    }

    /// Explicit venue distance, else haversine to downtown, else the
    /// host fallback.
    pub fn distance_miles(&self, ev: &CandidateEvent) -> Option<f64> {
        let venue = ev.venue.as_ref();
        venue
            .and_then(|v| v.downtown_distance_miles)
            .filter(|d| d.is_finite())
            .or_else(|| {
                let here = venue?.coordinates()?;
                Some(self.downtown?.haversine_miles(&here))
            })
            .or(self.fallback_distance_miles)
    }

    pub fn breakdown(&self, ev: &CandidateEvent) -> ImpactBreakdown {
        let metrics = ev.demand_metrics.as_ref();
        let attendance_input = metrics
            .and_then(|m| m.phq_attendance())
            .or(ev.expected_attendance.map(|a| a as f64));

        let attendance = attendance_score(attendance_input).clamp(0.0, 100.0);
        let event_type =
            type_score(ev.event_type, metrics.and_then(|m| m.local_rank())).clamp(0.0, 100.0);
        let proximity = proximity_score(self.distance_miles(ev)).clamp(0.0, 100.0);
        let timing = timing_score(ev.start_date, ev.start_time).clamp(0.0, 100.0);
        let price = price_score(ev.ticket_price_min, ev.ticket_price_max).clamp(0.0, 100.0);

        let sum = attendance * ATTENDANCE_WEIGHT
            + event_type * TYPE_WEIGHT
            + proximity * PROXIMITY_WEIGHT
            + timing * TIMING_WEIGHT
            + price * PRICE_WEIGHT;

        ImpactBreakdown {
            attendance,
            event_type,
            proximity,
            timing,
            price,
            total: sum.clamp(0.0, 100.0).round() as u32,
        }
    }

    pub fn score(&self, ev: &CandidateEvent) -> u32 {
        self.breakdown(ev).total
    }

    /// Fill `demand_impact_score` on every event.
    pub fn score_all(&self, events: &mut [CanonicalEvent]) {
        for ev in events.iter_mut() {
            ev.demand_impact_score = self.score(&ev.event);
        }
        tracing::debug!(target: "demand", events = events.len(), "impact scores assigned");
    }
}
