// tests/demand_pricing.rs
use chrono::{NaiveDate, NaiveTime};
use event_demand_engine::demand::{aggregate_day, attendance_score, calendar_bonus, DemandScorer};
use event_demand_engine::model::{SourceRef, Venue};
use event_demand_engine::{
    suggest_price, CandidateEvent, CanonicalEvent, DemandLevel, EventType, HostSettings,
};

fn canonical(id: &str, date: NaiveDate, score: u32) -> CanonicalEvent {
    let mut ev = CandidateEvent::new(format!("Show {id}"), SourceRef::new("ticketmaster", id));
    ev.start_date = Some(date);
    CanonicalEvent {
        sources: vec![ev.clone()],
        event: ev,
        demand_impact_score: score,
    }
}

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
}

#[test]
fn three_big_events_on_a_plain_tuesday() {
    let date = tuesday();
    let day = aggregate_day(
        date,
        &[
            canonical("a", date, 95),
            canonical("b", date, 80),
            canonical("c", date, 60),
        ],
    );
    assert_eq!(day.total_score, 181);
    assert_eq!(day.event_count, 3);
    assert_eq!(day.demand_level, DemandLevel::Extreme);
}

#[test]
fn attendance_breakpoints_match_the_table() {
    for (attendance, want) in [
        (100.0, 20.0),
        (500.0, 30.0),
        (1_000.0, 40.0),
        (5_000.0, 60.0),
        (10_000.0, 80.0),
        (50_000.0, 85.0),
        (100_000.0, 100.0),
    ] {
        assert!((attendance_score(Some(attendance)) - want).abs() < 1e-9);
    }
}

#[test]
fn empty_holiday_is_priced_from_the_bonus_alone() {
    let july4 = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
    let day = aggregate_day(july4, &[]);
    assert_eq!(day.total_score, 40);
    assert_eq!(day.demand_level, DemandLevel::Moderate);
    assert_eq!(calendar_bonus(july4).unwrap().label, "Independence Day");

    // July 4th 2025 is a Friday
    let p = suggest_price(&day, &HostSettings::default());
    assert!(p.is_weekend);
    assert_eq!(p.holiday_bonus, 40);
    assert_eq!(p.holiday_label.as_deref(), Some("Independence Day"));
    assert_eq!(p.suggested_price, 115.0);
    assert!(p.top_events.is_empty());
}

#[test]
fn high_demand_weekday_price_and_range() {
    let mut day = aggregate_day(tuesday(), &[canonical("a", tuesday(), 75)]);
    assert_eq!(day.demand_level, DemandLevel::High);
    day.events.clear();

    let settings = HostSettings::new(150.0, 100.0, 350.0).unwrap();
    let p = suggest_price(&day, &settings);
    assert_eq!(p.multiplier, 1.35);
    assert_eq!(p.suggested_price, 203.0);
    assert_eq!((p.min_price, p.max_price), (183.0, 223.0));
}

#[test]
fn top_events_are_capped_at_five_in_impact_order() {
    let date = tuesday();
    let events: Vec<_> = (0..7)
        .map(|i| canonical(&format!("e{i}"), date, 10 + i * 5))
        .collect();
    let day = aggregate_day(date, &events);
    let p = suggest_price(&day, &HostSettings::default());
    let scores: Vec<u32> = p.top_events.iter().map(|e| e.demand_impact_score).collect();
    assert_eq!(scores, vec![40, 35, 30, 25, 20]);
    assert_eq!(p.top_events[0].id, "ticketmaster:e6");
    assert_eq!(p.event_count, 7);
}

#[test]
fn malformed_values_stay_in_range() {
    let mut ev = CandidateEvent::new("Broken listing", SourceRef::new("memphis_travel", "x"));
    ev.start_date = Some(tuesday());
    ev.start_time = NaiveTime::from_hms_opt(20, 30, 0);
    ev.event_type = Some(EventType::Festival);
    ev.expected_attendance = Some(-5_000);
    ev.ticket_price_min = Some(-10.0);
    ev.ticket_price_max = Some(f64::NAN);
    ev.venue = Some(Venue {
        downtown_distance_miles: Some(-3.0),
        ..Venue::default()
    });

    let b = DemandScorer::default().breakdown(&ev);
    assert_eq!(b.attendance, 30.0);
    assert_eq!(b.price, 50.0);
    assert_eq!(b.proximity, 70.0);
    assert!(b.total <= 100);
}
