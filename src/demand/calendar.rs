//! Date-only demand bonuses: fixed holidays and recurring Memphis festival
//! windows. At most one rule applies per date; holidays are checked first.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarBonus {
    pub bonus: u32,
    pub label: &'static str,
}

/// (month, day, bonus, label)
const FIXED_HOLIDAYS: [(u32, u32, u32, &str); 5] = [
    (1, 1, 50, "New Year's Day"),
    (7, 4, 40, "Independence Day"),
    (12, 24, 30, "Christmas Eve"),
    (12, 25, 35, "Christmas Day"),
    (12, 31, 60, "New Year's Eve"),
];

struct FestivalWindow {
    month: u32,
    first_day: u32,
    last_day: u32,
    weekend_only: bool,
    bonus: u32,
    label: &'static str,
}

const FESTIVAL_WINDOWS: [FestivalWindow; 3] = [
    FestivalWindow {
        month: 5,
        first_day: 1,
        last_day: 7,
        weekend_only: true,
        bonus: 70,
        label: "Beale Street Music Festival",
    },
    FestivalWindow {
        month: 5,
        first_day: 12,
        last_day: 18,
        weekend_only: true,
        bonus: 50,
        label: "Memphis in May BBQ",
    },
    FestivalWindow {
        month: 8,
        first_day: 10,
        last_day: 18,
        weekend_only: false,
        bonus: 40,
        label: "Elvis Week",
    },
];

/// Friday, Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun)
}

pub fn calendar_bonus(date: NaiveDate) -> Option<CalendarBonus> {
    let (month, day) = (date.month(), date.day());

    let holiday = FIXED_HOLIDAYS
        .iter()
        .find(|(m, d, ..)| *m == month && *d == day)
        .map(|&(_, _, bonus, label)| CalendarBonus { bonus, label });
    if holiday.is_some() {
        return holiday;
    }

    FESTIVAL_WINDOWS
        .iter()
        .find(|w| {
            w.month == month
                && (w.first_day..=w.last_day).contains(&day)
                && (!w.weekend_only || is_weekend(date))
        })
        .map(|w| CalendarBonus {
            bonus: w.bonus,
            label: w.label,
        })
}
