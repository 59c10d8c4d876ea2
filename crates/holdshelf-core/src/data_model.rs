//! Data Model: CopyRecord, HoldingGroup, HoldingEntry, SummaryEntry
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Location label reserved for the summary row. Never a real location.
pub const SUMMARY_LOCATION: &str = "__HOLDINGSSUMMARYLOCATION__";

/// One physical, electronic or digital unit of a title, as handed over by a
/// backend adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyRecord {
    /// Backend item identifier (required)
    pub item_id: String,

    /// Owning library or branch (required)
    pub library_id: String,

    /// Shelving location within the library
    #[serde(default)]
    pub location_id: Option<String>,

    /// Circulation policy code
    #[serde(default)]
    pub policy_id: Option<String>,

    /// Status tokens in the order the backend reported them
    #[serde(default)]
    pub raw_status_signals: Vec<String>,

    /// Availability flag, for backends that report one next to the statuses
    #[serde(default)]
    pub available: Option<bool>,

    #[serde(default)]
    pub holding_group_id: Option<String>,

    /// Volume/issue label, e.g. "2020:4"
    #[serde(default)]
    pub enumeration: Option<String>,

    /// Physical format key used for process-type filtering
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub process_type: Option<String>,

    /// Explicit display label; overrides branch/location resolution
    #[serde(default)]
    pub location_label: Option<String>,

    /// Display name of the shelving location
    #[serde(default)]
    pub location_name: Option<String>,

    #[serde(default)]
    pub call_number: Option<String>,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    /// Holds queued on this copy
    #[serde(default)]
    pub queue_length: u32,

    #[serde(default)]
    pub department: Option<String>,

    #[serde(default)]
    pub notes: Vec<String>,
}

impl CopyRecord {
    pub fn new(item_id: impl Into<String>, library_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            library_id: library_id.into(),
            ..Default::default()
        }
    }

    pub fn at_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    pub fn with_location_name(mut self, name: impl Into<String>) -> Self {
        self.location_name = Some(name.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.location_label = Some(label.into());
        self
    }

    pub fn with_policy(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    pub fn with_status(mut self, signal: impl Into<String>) -> Self {
        self.raw_status_signals.push(signal.into());
        self
    }

    pub fn available(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }

    pub fn in_group(mut self, holding_group_id: impl Into<String>) -> Self {
        self.holding_group_id = Some(holding_group_id.into());
        self
    }

    pub fn with_enumeration(mut self, enumeration: impl Into<String>) -> Self {
        self.enumeration = Some(enumeration.into());
        self
    }

    pub fn with_process_type(
        mut self,
        format: impl Into<String>,
        process_type: impl Into<String>,
    ) -> Self {
        self.format = Some(format.into());
        self.process_type = Some(process_type.into());
        self
    }

    pub fn with_call_number(mut self, call_number: impl Into<String>) -> Self {
        self.call_number = Some(call_number.into());
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn with_queue(mut self, queue_length: u32) -> Self {
        self.queue_length = queue_length;
        self
    }
}

/// A holding-level record. May describe a location with no copies at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingGroup {
    pub id: String,
    pub library_id: String,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub call_number: Option<String>,
    /// Backend visibility flag; suppressed groups and their copies are hidden
    #[serde(default)]
    pub suppressed: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl HoldingGroup {
    pub fn new(id: impl Into<String>, library_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            library_id: library_id.into(),
            ..Default::default()
        }
    }

    pub fn at_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    pub fn with_call_number(mut self, call_number: impl Into<String>) -> Self {
        self.call_number = Some(call_number.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn suppressed(mut self) -> Self {
        self.suppressed = true;
        self
    }
}

/// Canonical, backend-independent holdings row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingEntry {
    /// Bibliographic record id
    pub id: String,
    pub item_id: String,
    pub holding_group_id: Option<String>,
    pub available: bool,
    pub status: String,
    pub location_label: String,
    pub location_code: Option<String>,
    pub branch_code: String,
    pub call_number: String,
    pub due_date: Option<NaiveDate>,
    pub requests_placed: u32,
    /// Position in normalizer output; last-resort sort tiebreak
    pub sort_key: usize,
    pub enumeration: Option<String>,
    pub barcode: Option<String>,
    pub department: Option<String>,
    pub notes: Vec<String>,
    /// Placeholder for a copy-less holding; details are fetched lazily
    pub detail_pending: bool,
}

impl HoldingEntry {
    pub fn is_placeholder(&self) -> bool {
        self.detail_pending
    }
}

/// Aggregate row appended after all real entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub available: usize,
    pub total: usize,
    pub locations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservations: Option<u32>,
    pub location_label: String,
}

impl SummaryEntry {
    pub fn new(available: usize, total: usize, locations: usize) -> Self {
        Self {
            available,
            total,
            locations,
            reservations: None,
            location_label: SUMMARY_LOCATION.to_string(),
        }
    }
}

/// A row of display output: real entries first, then exactly one summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HoldingsRow {
    Item(HoldingEntry),
    Summary(SummaryEntry),
}

/// Hold granularity requested by the patron.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldLevel {
    #[default]
    Copy,
    Title,
}

impl HoldLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldLevel::Copy => "copy",
            HoldLevel::Title => "title",
        }
    }
}

impl fmt::Display for HoldLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of the pickup-location catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupLocation {
    pub location_id: String,
    pub label: String,
}

impl PickupLocation {
    pub fn new(location_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            label: label.into(),
        }
    }
}

/// Branch id to display name lookup. Unknown branches display as their id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchDirectory(HashMap<String, String>);

impl BranchDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.0.insert(id.into(), name.into());
        self
    }

    pub fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.0.get(id).map(String::as_str).unwrap_or(id)
    }
}

impl FromIterator<(String, String)> for BranchDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
