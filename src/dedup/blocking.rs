//! Blocking index: cheap keys that bound pairwise comparison.
//!
//! Key = `<start date or "nodate">:<first 10 chars of normalized title>`.
//! Each dated candidate is also registered under the previous and next day's
//! key so off-by-one dates from different sources still meet.

use chrono::{Days, NaiveDate};
use std::collections::HashMap;

use crate::ingest::normalize_title;
use crate::model::CandidateEvent;

pub const TITLE_PREFIX_LEN: usize = 10;
const NO_DATE: &str = "nodate";

pub fn title_prefix(normalized_title: &str) -> String {
    normalized_title.chars().take(TITLE_PREFIX_LEN).collect()
}

pub fn blocking_key(date: Option<NaiveDate>, normalized_title: &str) -> String {
    let date_part = date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NO_DATE.to_string());
    format!("{}:{}", date_part, title_prefix(normalized_title))
}

/// One comparison bucket; members are indices into the candidate slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub key: String,
    pub members: Vec<usize>,
}

/// Blocks in first-registration order. A candidate may sit in up to three
/// blocks; the cluster builder resolves it once globally.
#[derive(Debug, Clone, Default)]
pub struct BlockingIndex {
    blocks: Vec<Block>,
    by_key: HashMap<String, usize>,
}

impl BlockingIndex {
    pub fn build(candidates: &[CandidateEvent]) -> Self {
        let mut index = Self::default();
        for (i, ev) in candidates.iter().enumerate() {
            let normalized = normalize_title(&ev.title);
            index.register(blocking_key(ev.start_date, &normalized), i);

            if let Some(date) = ev.start_date {
                let neighbours = [
                    date.checked_sub_days(Days::new(1)),
                    date.checked_add_days(Days::new(1)),
                ];
                for adjacent in neighbours.into_iter().flatten() {
                    index.register(blocking_key(Some(adjacent), &normalized), i);
                }
            }
        }
        index
    }

    fn register(&mut self, key: String, member: usize) {
        let slot = match self.by_key.get(&key) {
            Some(&slot) => slot,
            None => {
                self.blocks.push(Block {
                    key: key.clone(),
                    members: Vec::new(),
                });
                self.by_key.insert(key, self.blocks.len() - 1);
                self.blocks.len() - 1
            }
        };
        let members = &mut self.blocks[slot].members;
        if !members.contains(&member) {
            members.push(member);
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, key: &str) -> Option<&Block> {
        self.by_key.get(key).map(|&slot| &self.blocks[slot])
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
