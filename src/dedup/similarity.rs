//! Weighted pairwise similarity between two candidates, in [0,1].
//!
//! total = 0.40·title + 0.25·date + 0.25·venue + 0.10·type
//!
//! Title and venue-name comparisons use normalized Levenshtein distance
//! (`strsim::levenshtein`) over normalized text.

use chrono::NaiveDate;
use serde::Serialize;
use strsim::levenshtein;

use crate::ingest::normalize_title;
use crate::model::{CandidateEvent, EventType, Venue};

pub const TITLE_WEIGHT: f64 = 0.40;
pub const DATE_WEIGHT: f64 = 0.25;
pub const VENUE_WEIGHT: f64 = 0.25;
pub const TYPE_WEIGHT: f64 = 0.10;

/// Score for a component that cannot be compared (missing on one side).
const NEUTRAL: f64 = 0.5;

/// (max whole-day gap, score); first match wins.
const DATE_STEPS: [(u64, f64); 3] = [(0, 1.0), (1, 0.8), (3, 0.5)];

/// (max |Δlat| and |Δlng| in degrees, score); first match wins, else `FAR_VENUE`.
const COORD_STEPS: [(f64, f64); 2] = [(0.01, 1.0), (0.03, 0.8)];
const FAR_VENUE: f64 = 0.3;

/// Event types that commonly describe the same happening across sources.
const ADJACENT_TYPES: [(EventType, EventType); 2] = [
    (EventType::Concert, EventType::Festival),
    (EventType::Conference, EventType::Convention),
];
const ADJACENT_TYPE_SCORE: f64 = 0.7;
const UNRELATED_TYPE_SCORE: f64 = 0.3;

/// Per-component scores, kept for debugging merge decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityBreakdown {
    pub title: f64,
    pub date: f64,
    pub venue: f64,
    pub event_type: f64,
    pub total: f64,
}

/// Similarity of two already-normalized strings.
pub fn normalized_text_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    let distance = levenshtein(a, b);
    (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Title similarity over normalized titles.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    normalized_text_similarity(&normalize_title(a), &normalize_title(b))
}

pub fn date_similarity(a: Option<NaiveDate>, b: Option<NaiveDate>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    let gap = (a - b).num_days().unsigned_abs();
    DATE_STEPS
        .iter()
        .find(|(max_gap, _)| gap <= *max_gap)
        .map(|(_, score)| *score)
        .unwrap_or(0.0)
}

pub fn venue_similarity(a: Option<&Venue>, b: Option<&Venue>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return NEUTRAL;
    };

    if let (Some(pa), Some(pb)) = (a.coordinates(), b.coordinates()) {
        let d_lat = (pa.latitude - pb.latitude).abs();
        let d_lng = (pa.longitude - pb.longitude).abs();
        return COORD_STEPS
            .iter()
            .find(|(max_delta, _)| d_lat < *max_delta && d_lng < *max_delta)
            .map(|(_, score)| *score)
            .unwrap_or(FAR_VENUE);
    }

    match (a.display_name(), b.display_name()) {
        (Some(na), Some(nb)) => title_similarity(na, nb),
        _ => NEUTRAL,
    }
}

pub fn type_similarity(a: Option<EventType>, b: Option<EventType>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return NEUTRAL;
    };
    if a == b {
        return 1.0;
    }
    let adjacent = ADJACENT_TYPES
        .iter()
        .any(|&(x, y)| (x == a && y == b) || (x == b && y == a));
    if adjacent {
        ADJACENT_TYPE_SCORE
    } else {
        UNRELATED_TYPE_SCORE
    }
}

pub fn similarity_breakdown(a: &CandidateEvent, b: &CandidateEvent) -> SimilarityBreakdown {
    let title = title_similarity(&a.title, &b.title);
    let date = date_similarity(a.start_date, b.start_date);
    let venue = venue_similarity(a.venue.as_ref(), b.venue.as_ref());
    let event_type = type_similarity(a.event_type, b.event_type);
    let total = title * TITLE_WEIGHT
        + date * DATE_WEIGHT
        + venue * VENUE_WEIGHT
        + event_type * TYPE_WEIGHT;
    SimilarityBreakdown {
        title,
        date,
        venue,
        event_type,
        total: total.clamp(0.0, 1.0),
    }
}

/// Weighted similarity in [0,1].
pub fn similarity(a: &CandidateEvent, b: &CandidateEvent) -> f64 {
    similarity_breakdown(a, b).total
}
