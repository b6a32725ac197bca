// src/ingest/types.rs
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::model::CandidateEvent;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, swapping the ends if they arrive reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        std::iter::successors(Some(self.start), move |d| {
            d.checked_add_days(Days::new(1)).filter(|next| *next <= end)
        })
    }
}

/// Offset/limit window for one page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Pagination {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    pub fn next(&self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }
}

/// One page of candidates returned by an adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePage {
    pub events: Vec<CandidateEvent>,
    pub has_more: bool,
}

impl SourcePage {
    pub fn last(events: Vec<CandidateEvent>) -> Self {
        Self {
            events,
            has_more: false,
        }
    }
}

/// Contract every event source implements. Scraping and API parsing live
/// behind this trait; the engine only sees candidate records.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(
        &self,
        range: &DateRange,
        page: Pagination,
    ) -> Result<SourcePage, SourceError>;
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn days_are_inclusive_and_ordered() {
        let r = DateRange::new(d("2025-02-27"), d("2025-03-02"));
        let days: Vec<_> = r.days().collect();
        assert_eq!(
            days,
            vec![
                d("2025-02-27"),
                d("2025-02-28"),
                d("2025-03-01"),
                d("2025-03-02")
            ]
        );
    }

    #[test]
    fn reversed_range_is_swapped() {
        let r = DateRange::new(d("2025-03-10"), d("2025-03-01"));
        assert_eq!(r.start, d("2025-03-01"));
        assert!(r.contains(d("2025-03-05")));
        assert_eq!(DateRange::single(d("2025-01-01")).days().count(), 1);
    }

    #[test]
    fn pagination_advances_by_limit() {
        let p = Pagination::first(100).next().next();
        assert_eq!(p, Pagination { offset: 200, limit: 100 });
    }
}
