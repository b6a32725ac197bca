use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use crate::error::SourceError;
use crate::ingest::types::{DateRange, Pagination, SourceAdapter, SourcePage};
use crate::model::CandidateEvent;

/// Serves a fixed list of candidates, paginated and filtered by date range
/// the way a live API would. Backs the CLI and tests.
#[derive(Debug, Clone)]
pub struct FixtureAdapter {
    name: String,
    events: Vec<CandidateEvent>,
}

impl FixtureAdapter {
    pub fn new(name: impl Into<String>, events: Vec<CandidateEvent>) -> Self {
        Self {
            name: name.into(),
            events,
        }
    }

    /// Parse a JSON array of candidates.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let name = name.into();
        let events: Vec<CandidateEvent> = serde_json::from_str(json)
            .with_context(|| format!("parsing {name} fixture json"))?;
        Ok(Self::new(name, events))
    }

    /// Read a JSON fixture file; the adapter is named after the file stem.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("fixture")
            .to_string();
        Self::from_json(name, &json)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
    async fn fetch(
        &self,
        range: &DateRange,
        page: Pagination,
    ) -> Result<SourcePage, SourceError> {
        // Dateless records pass through so validation can count them.
        let in_range: Vec<&CandidateEvent> = self
            .events
            .iter()
            .filter(|e| e.start_date.map_or(true, |d| range.contains(d)))
            .collect();

        let events: Vec<CandidateEvent> = in_range
            .iter()
            .skip(page.offset)
            .take(page.limit)
            .map(|e| (*e).clone())
            .collect();
        let has_more = page.offset + page.limit < in_range.len();
        Ok(SourcePage { events, has_more })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
