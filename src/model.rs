//! model.rs — records flowing through the pipeline.
//!
//! `CandidateEvent` is one source's unverified view of a happening,
//! `CanonicalEvent` is the merged record after deduplication, and
//! `DailyDemand` / `PriceSuggestion` are the per-date outputs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Broad event category shared by every source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Concert,
    Sports,
    Festival,
    Convention,
    Conference,
    Theater,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::Concert,
        EventType::Sports,
        EventType::Festival,
        EventType::Convention,
        EventType::Conference,
        EventType::Theater,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Concert => "concert",
            EventType::Sports => "sports",
            EventType::Festival => "festival",
            EventType::Convention => "convention",
            EventType::Conference => "conference",
            EventType::Theater => "theater",
            EventType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Active,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Great-circle distance in miles.
    pub fn haversine_miles(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_MILES: f64 = 3959.0;
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lng = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_MILES * c
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downtown_distance_miles: Option<f64>,
}

impl Venue {
    /// Both coordinates, when present.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Name with surrounding whitespace removed; `None` when blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Where a candidate came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_event_id: Option<String>,
}

impl SourceRef {
    pub fn new(source_name: impl Into<String>, source_event_id: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            source_event_id: Some(source_event_id.into()),
        }
    }

    /// `sourceName:sourceEventId`, the persistence key for one contribution.
    pub fn key(&self) -> Option<String> {
        self.source_event_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| format!("{}:{}", self.source_name, id))
    }
}

/// Enrichment metrics reported by high-quality sources (rank fields,
/// predicted attendance). Keys are free-form; lookups below name the ones
/// the demand scorer understands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandMetrics(pub BTreeMap<String, f64>);

impl DemandMetrics {
    pub const RANK: &'static str = "rank";
    pub const LOCAL_RANK: &'static str = "local_rank";
    pub const AVIATION_RANK: &'static str = "aviation_rank";
    pub const PHQ_ATTENDANCE: &'static str = "phq_attendance";

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied().filter(|v| v.is_finite())
    }

    /// Source-predicted attendance; zero counts as absent.
    pub fn phq_attendance(&self) -> Option<f64> {
        self.get(Self::PHQ_ATTENDANCE).filter(|v| *v > 0.0)
    }

    /// Local rank on a 0–100 scale; zero counts as absent.
    pub fn local_rank(&self) -> Option<f64> {
        self.get(Self::LOCAL_RANK)
            .filter(|v| *v != 0.0)
            .map(|v| v.clamp(0.0, 100.0))
    }

    /// Key-by-key merge; `other` wins on collision.
    pub fn merge_from(&mut self, other: &DemandMetrics) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), *v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One source's view of an event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub title: String,
    #[serde(default)]
    pub normalized_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_attendance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_price_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_price_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_url: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<Venue>,
    /// Source-asserted reliability in [0,1].
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub source: SourceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_metrics: Option<DemandMetrics>,
}

impl CandidateEvent {
    /// Minimal constructor used by adapters and tests; normalizes the title.
    pub fn new(title: impl Into<String>, source: SourceRef) -> Self {
        let title = title.into();
        Self {
            normalized_title: crate::ingest::normalize_title(&title),
            title,
            source,
            ..Self::default()
        }
    }
}

/// The merged representation of one real-world event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    #[serde(flatten)]
    pub event: CandidateEvent,
    /// Every contributing candidate, for audit/provenance.
    pub sources: Vec<CandidateEvent>,
    #[serde(default)]
    pub demand_impact_score: u32,
}

impl CanonicalEvent {
    /// Stable identifier: the winning source's persistence key, or the
    /// normalized title and date when that source had no id.
    pub fn id(&self) -> String {
        self.event.source.key().unwrap_or_else(|| {
            let date = self
                .event
                .start_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "nodate".to_string());
            format!("{}:{}", date, self.event.normalized_title)
        })
    }

    /// Keys of every contributing source that supplied an id.
    pub fn source_keys(&self) -> Vec<String> {
        self.sources.iter().filter_map(|s| s.source.key()).collect()
    }

    /// The merged record viewed as a candidate again (for re-running dedup).
    pub fn as_candidate(&self) -> CandidateEvent {
        self.event.clone()
    }

    pub fn is_active(&self) -> bool {
        self.event.status == EventStatus::Active
    }
}

/// Discretized demand bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl DemandLevel {
    /// Upper (exclusive) score bound per level; `Extreme` is open-ended.
    const BOUNDS: [(u32, DemandLevel); 4] = [
        (30, DemandLevel::Low),
        (60, DemandLevel::Moderate),
        (100, DemandLevel::High),
        (150, DemandLevel::VeryHigh),
    ];

    pub fn from_score(score: u32) -> Self {
        Self::BOUNDS
            .iter()
            .find(|(upper, _)| score < *upper)
            .map(|(_, level)| *level)
            .unwrap_or(DemandLevel::Extreme)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DemandLevel::Low => "low",
            DemandLevel::Moderate => "moderate",
            DemandLevel::High => "high",
            DemandLevel::VeryHigh => "very_high",
            DemandLevel::Extreme => "extreme",
        }
    }
}

/// Aggregated demand for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDemand {
    pub date: NaiveDate,
    /// Diminishing-returns sum of event scores, rounded; not clamped.
    pub event_score: u32,
    /// Calendar bonus added on top of `event_score`.
    pub calendar_bonus: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_label: Option<String>,
    /// `event_score + calendar_bonus`; may exceed 100.
    pub total_score: u32,
    pub event_count: usize,
    pub demand_level: DemandLevel,
    /// Contributing events, highest impact first.
    pub events: Vec<CanonicalEvent>,
}

/// Short reference to an event backing a price suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingEvent {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    pub demand_impact_score: u32,
}

/// Bounded nightly price recommendation for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    pub date: NaiveDate,
    pub demand_level: DemandLevel,
    pub total_demand_score: u32,
    pub event_count: usize,
    /// Reported rounded to two decimals.
    pub multiplier: f64,
    pub suggested_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub base_rate: f64,
    pub is_weekend: bool,
    pub holiday_bonus: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holiday_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_events: Vec<ContributingEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_level_boundaries() {
        assert_eq!(DemandLevel::from_score(0), DemandLevel::Low);
        assert_eq!(DemandLevel::from_score(29), DemandLevel::Low);
        assert_eq!(DemandLevel::from_score(30), DemandLevel::Moderate);
        assert_eq!(DemandLevel::from_score(59), DemandLevel::Moderate);
        assert_eq!(DemandLevel::from_score(60), DemandLevel::High);
        assert_eq!(DemandLevel::from_score(99), DemandLevel::High);
        assert_eq!(DemandLevel::from_score(100), DemandLevel::VeryHigh);
        assert_eq!(DemandLevel::from_score(149), DemandLevel::VeryHigh);
        assert_eq!(DemandLevel::from_score(150), DemandLevel::Extreme);
        assert_eq!(DemandLevel::from_score(900), DemandLevel::Extreme);
    }

    #[test]
    fn source_key_requires_id() {
        let with_id = SourceRef::new("ticketmaster", "tm-1");
        assert_eq!(with_id.key().as_deref(), Some("ticketmaster:tm-1"));

        let without = SourceRef {
            source_name: "downtown_memphis".into(),
            source_event_id: None,
        };
        assert!(without.key().is_none());
    }

    #[test]
    fn metrics_merge_overwrites_on_collision() {
        let mut a = DemandMetrics::default()
            .with(DemandMetrics::RANK, 60.0)
            .with(DemandMetrics::LOCAL_RANK, 40.0);
        let b = DemandMetrics::default()
            .with(DemandMetrics::LOCAL_RANK, 70.0)
            .with(DemandMetrics::PHQ_ATTENDANCE, 12_000.0);
        a.merge_from(&b);
        assert_eq!(a.get(DemandMetrics::RANK), Some(60.0));
        assert_eq!(a.local_rank(), Some(70.0));
        assert_eq!(a.phq_attendance(), Some(12_000.0));
    }

    #[test]
    fn serializes_snake_case_enums() {
        let v = serde_json::to_value(DemandLevel::VeryHigh).unwrap();
        assert_eq!(v, serde_json::json!("very_high"));
        let t: EventType = serde_json::from_str("\"festival\"").unwrap();
        assert_eq!(t, EventType::Festival);
    }

    #[test]
    fn haversine_is_roughly_right() {
        let downtown = GeoPoint {
            latitude: 35.1495,
            longitude: -90.0490,
        };
        let airport = GeoPoint {
            latitude: 35.0424,
            longitude: -89.9767,
        };
        let d = downtown.haversine_miles(&airport);
        assert!(d > 7.0 && d < 9.0, "got {d}");
        assert!(downtown.haversine_miles(&downtown).abs() < 1e-9);
    }
}
