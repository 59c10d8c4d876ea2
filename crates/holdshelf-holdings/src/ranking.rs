//! Holdings ranking and summary.
//!
//! Comparator keys, in order:
//! 1. branch rank (`branch/location` composite first, then plain branch)
//! 2. location rank
//! 3. location label, case-insensitive
//! 4. enumeration, newest first (only with `sort_by_enum_chron`)
//! 5. `sort_key`
//!
//! A ranked entry sorts before an unranked one at steps 1 and 2.

use crate::natural::natural_cmp;
use holdshelf_core::{HoldingEntry, HoldingsRow, RankingConfig, SummaryEntry};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, debug_span};

/// Sorted entries plus the summary that goes after them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedHoldings {
    pub entries: Vec<HoldingEntry>,
    pub summary: SummaryEntry,
}

impl RankedHoldings {
    /// Display rows: every entry in order, then the summary.
    pub fn into_rows(self) -> Vec<HoldingsRow> {
        let mut rows: Vec<HoldingsRow> =
            self.entries.into_iter().map(HoldingsRow::Item).collect();
        rows.push(HoldingsRow::Summary(self.summary));
        rows
    }
}

#[derive(Debug, Clone, Default)]
pub struct HoldingsRanker {
    config: RankingConfig,
}

impl HoldingsRanker {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn compare(&self, a: &HoldingEntry, b: &HoldingEntry) -> Ordering {
        cmp_ranks(self.branch_rank(a), self.branch_rank(b))
            .then_with(|| cmp_ranks(self.location_rank(a), self.location_rank(b)))
            .then_with(|| cmp_caseless(&a.location_label, &b.location_label))
            .then_with(|| {
                if self.config.sort_by_enum_chron {
                    cmp_enumeration_desc(a.enumeration.as_deref(), b.enumeration.as_deref())
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| a.sort_key.cmp(&b.sort_key))
    }

    pub fn sort(&self, entries: &mut [HoldingEntry]) {
        entries.sort_by(|a, b| self.compare(a, b));
    }

    pub fn summarize(&self, entries: &[HoldingEntry]) -> SummaryEntry {
        let counted: Vec<&HoldingEntry> = entries
            .iter()
            .filter(|e| self.config.count_placeholders_in_total || !e.detail_pending)
            .collect();

        let available = counted.iter().filter(|e| e.available).count();
        let locations: HashSet<&str> =
            counted.iter().map(|e| e.location_label.as_str()).collect();

        let mut summary = SummaryEntry::new(available, counted.len(), locations.len());
        if self.config.display_total_hold_count {
            let requests = entries.iter().map(|e| e.requests_placed);
            summary.reservations = Some(if self.config.single_reservation_queue {
                requests.max().unwrap_or(0)
            } else {
                requests.fold(0u32, u32::saturating_add)
            });
        }
        summary
    }

    /// Sort `entries` and compute their summary.
    pub fn rank(&self, mut entries: Vec<HoldingEntry>) -> RankedHoldings {
        let span = debug_span!("rank", entries = entries.len());
        let _enter = span.enter();

        self.sort(&mut entries);
        let summary = self.summarize(&entries);
        debug!(
            available = summary.available,
            total = summary.total,
            locations = summary.locations,
            "holdings ranked"
        );

        RankedHoldings { entries, summary }
    }

    fn branch_rank(&self, entry: &HoldingEntry) -> Option<i32> {
        let order = &self.config.branch_order;
        entry
            .location_code
            .as_deref()
            .and_then(|location| order.rank(&format!("{}/{}", entry.branch_code, location)))
            .or_else(|| order.rank(&entry.branch_code))
    }

    fn location_rank(&self, entry: &HoldingEntry) -> Option<i32> {
        entry
            .location_code
            .as_deref()
            .and_then(|location| self.config.location_order.rank(location))
    }
}

fn cmp_ranks(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_caseless(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

// Empty enumerations go last.
fn cmp_enumeration_desc(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.filter(|s| !s.trim().is_empty());
    let b = b.filter(|s| !s.trim().is_empty());
    match (a, b) {
        (Some(a), Some(b)) => natural_cmp(b, a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
