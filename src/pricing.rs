// src/pricing.rs
//! Demand level → bounded nightly price.

use serde::{Deserialize, Serialize};

use crate::demand::calendar::is_weekend;
use crate::error::SettingsError;
use crate::model::{ContributingEvent, DailyDemand, DemandLevel, PriceSuggestion};

pub const WEEKEND_FACTOR: f64 = 1.15;
pub const RANGE_SPREAD: f64 = 0.10;
pub const TOP_EVENTS: usize = 5;

const LEVEL_MULTIPLIERS: [(DemandLevel, f64); 5] = [
    (DemandLevel::Low, 0.85),
    (DemandLevel::Moderate, 1.00),
    (DemandLevel::High, 1.35),
    (DemandLevel::VeryHigh, 1.75),
    (DemandLevel::Extreme, 2.50),
];

fn default_base_rate() -> f64 {
    100.0
}
fn default_min_rate() -> f64 {
    50.0
}
fn default_max_rate() -> f64 {
    500.0
}

/// A host's nightly rate settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostSettings {
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            base_rate: default_base_rate(),
            min_rate: default_min_rate(),
            max_rate: default_max_rate(),
        }
    }
}

impl HostSettings {
    pub fn new(base_rate: f64, min_rate: f64, max_rate: f64) -> Result<Self, SettingsError> {
        let s = Self {
            base_rate,
            min_rate,
            max_rate,
        };
        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("base_rate", self.base_rate),
            ("min_rate", self.min_rate),
            ("max_rate", self.max_rate),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SettingsError::InvalidRate { field, value });
            }
        }
        if self.min_rate > self.max_rate {
            return Err(SettingsError::InvertedBounds {
                min: self.min_rate,
                max: self.max_rate,
            });
        }
        Ok(())
    }
}

/// Per-invocation settings; any absent rate falls back to the engine default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rate: Option<f64>,
}

impl RateOverrides {
    pub fn resolve(&self, defaults: &HostSettings) -> Result<HostSettings, SettingsError> {
        HostSettings::new(
            self.base_rate.unwrap_or(defaults.base_rate),
            self.min_rate.unwrap_or(defaults.min_rate),
            self.max_rate.unwrap_or(defaults.max_rate),
        )
    }
}

impl From<HostSettings> for RateOverrides {
    fn from(s: HostSettings) -> Self {
        Self {
            base_rate: Some(s.base_rate),
            min_rate: Some(s.min_rate),
            max_rate: Some(s.max_rate),
        }
    }
}

pub fn level_multiplier(level: DemandLevel) -> f64 {
    LEVEL_MULTIPLIERS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, m)| *m)
        .unwrap_or(1.0)
}

/// Never panics, even on inverted bounds (lower bound wins).
fn clamp_rate(x: f64, min: f64, max: f64) -> f64 {
    x.min(max).max(min)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn suggest_price(day: &DailyDemand, settings: &HostSettings) -> PriceSuggestion {
    let weekend = is_weekend(day.date);
    let mut multiplier = level_multiplier(day.demand_level);
    if weekend {
        multiplier *= WEEKEND_FACTOR;
    }

    let (lo, hi) = (settings.min_rate, settings.max_rate);
    let suggested = clamp_rate(settings.base_rate * multiplier, lo, hi).round();
    let min_price = clamp_rate((suggested * (1.0 - RANGE_SPREAD)).round(), lo, hi);
    let max_price = clamp_rate((suggested * (1.0 + RANGE_SPREAD)).round(), lo, hi);

    let top_events = day
        .events
        .iter()
        .take(TOP_EVENTS)
        .map(|e| ContributingEvent {
            id: e.id(),
            title: e.event.title.clone(),
            event_type: e.event.event_type,
            demand_impact_score: e.demand_impact_score,
        })
        .collect();

    tracing::debug!(
        target: "pricing",
        date = %day.date,
        level = day.demand_level.as_str(),
        multiplier,
        suggested,
        "price suggested"
    );

    PriceSuggestion {
        date: day.date,
        demand_level: day.demand_level,
        total_demand_score: day.total_score,
        event_count: day.event_count,
        multiplier: round2(multiplier),
        suggested_price: suggested,
        min_price,
        max_price,
        base_rate: settings.base_rate,
        is_weekend: weekend,
        holiday_bonus: day.calendar_bonus,
        holiday_label: day.calendar_label.clone(),
        top_events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(date: NaiveDate, level: DemandLevel) -> DailyDemand {
        DailyDemand {
            date,
            event_score: 0,
            calendar_bonus: 0,
            calendar_label: None,
            total_score: 0,
            event_count: 0,
            demand_level: level,
            events: vec![],
        }
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
    }

    #[test]
    fn high_demand_weekday_example() {
        let s = HostSettings::new(150.0, 100.0, 350.0).unwrap();
        let p = suggest_price(&day(tuesday(), DemandLevel::High), &s);
        assert_eq!(p.multiplier, 1.35);
        assert_eq!(p.suggested_price, 203.0);
        assert_eq!(p.min_price, 183.0);
        assert_eq!(p.max_price, 223.0);
        assert!(!p.is_weekend);
        assert_eq!(p.base_rate, 150.0);
    }

    #[test]
    fn weekend_factor_and_rounded_multiplier() {
        let sat = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let p = suggest_price(&day(sat, DemandLevel::High), &HostSettings::default());
        assert!(p.is_weekend);
        assert_eq!(p.multiplier, 1.55);
        // 100 × 1.5525 = 155.25
        assert_eq!(p.suggested_price, 155.0);
    }

    #[test]
    fn price_is_clamped_to_bounds() {
        let s = HostSettings::new(300.0, 100.0, 500.0).unwrap();
        let p = suggest_price(&day(tuesday(), DemandLevel::Extreme), &s);
        assert_eq!(p.suggested_price, 500.0);
        assert_eq!(p.max_price, 500.0);
        assert_eq!(p.min_price, 450.0);

        let s = HostSettings::new(100.0, 90.0, 400.0).unwrap();
        let p = suggest_price(&day(tuesday(), DemandLevel::Low), &s);
        assert_eq!(p.suggested_price, 90.0);
        assert_eq!(p.min_price, 90.0);
        assert_eq!(p.max_price, 99.0);
    }

    #[test]
    fn settings_validation() {
        assert!(HostSettings::default().validate().is_ok());
        assert_eq!(
            HostSettings::new(100.0, 300.0, 200.0),
            Err(SettingsError::InvertedBounds {
                min: 300.0,
                max: 200.0
            })
        );
        assert!(matches!(
            HostSettings::new(f64::NAN, 50.0, 500.0),
            Err(SettingsError::InvalidRate {
                field: "base_rate",
                ..
            })
        ));
        assert!(HostSettings::new(100.0, -1.0, 500.0).is_err());
    }

    #[test]
    fn overrides_fall_back_to_defaults() {
        let partial = RateOverrides {
            base_rate: Some(180.0),
            ..RateOverrides::default()
        };
        let resolved = partial.resolve(&HostSettings::default()).unwrap();
        assert_eq!(resolved, HostSettings::new(180.0, 50.0, 500.0).unwrap());

        let bad = RateOverrides {
            min_rate: Some(900.0),
            ..RateOverrides::default()
        };
        assert!(bad.resolve(&HostSettings::default()).is_err());
    }

    #[test]
    fn multiplier_table() {
        assert_eq!(level_multiplier(DemandLevel::Low), 0.85);
        assert_eq!(level_multiplier(DemandLevel::VeryHigh), 1.75);
        assert_eq!(level_multiplier(DemandLevel::Extreme), 2.5);
    }
}
