//! Holding normalization.
//!
//! Turns backend copy records and holding-level records into canonical
//! [`HoldingEntry`] rows:
//! - copies of suppressed holdings and hidden process types are dropped
//! - status and availability come from the [`StatusClassifier`]
//! - holdings left without copies get a placeholder row

use crate::classifier::{Classification, StatusClassifier};
use holdshelf_core::{
    BranchDirectory, CopyRecord, ErrorSink, HoldingEntry, HoldingGroup, NormalizationError,
    NormalizerConfig,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, debug_span, warn};

/// Everything the backend returned for one bibliographic record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeInput {
    pub bib_id: String,
    #[serde(default)]
    pub copies: Vec<CopyRecord>,
    #[serde(default)]
    pub holding_groups: Vec<HoldingGroup>,
    /// Title-level hold queue, shared by every copy
    #[serde(default)]
    pub title_queue_length: u32,
}

impl NormalizeInput {
    pub fn new(bib_id: impl Into<String>) -> Self {
        Self {
            bib_id: bib_id.into(),
            ..Default::default()
        }
    }

    pub fn with_copy(mut self, copy: CopyRecord) -> Self {
        self.copies.push(copy);
        self
    }

    pub fn with_group(mut self, group: HoldingGroup) -> Self {
        self.holding_groups.push(group);
        self
    }

    pub fn with_title_queue(mut self, length: u32) -> Self {
        self.title_queue_length = length;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct HoldingNormalizer {
    config: NormalizerConfig,
    classifier: StatusClassifier,
    branches: BranchDirectory,
}

impl HoldingNormalizer {
    pub fn new(config: NormalizerConfig, classifier: StatusClassifier) -> Self {
        Self {
            config,
            classifier,
            branches: BranchDirectory::default(),
        }
    }

    pub fn with_branches(mut self, branches: BranchDirectory) -> Self {
        self.branches = branches;
        self
    }

    pub fn classifier(&self) -> &StatusClassifier {
        &self.classifier
    }

    /// Normalize one record's holdings. Bad records are reported to `errors`
    /// and skipped; the rest of the batch is still processed.
    ///
    /// `sort_key` follows output order: copies first, then placeholders.
    pub fn normalize(
        &self,
        input: &NormalizeInput,
        errors: &mut impl ErrorSink,
    ) -> Vec<HoldingEntry> {
        let span = debug_span!("normalize", bib_id = %input.bib_id, copies = input.copies.len());
        let _enter = span.enter();

        let mut groups: HashMap<&str, &HoldingGroup> = HashMap::new();
        let mut valid_groups = Vec::new();
        for (index, group) in input.holding_groups.iter().enumerate() {
            match validate_group(index, group) {
                Ok(()) => {
                    groups.insert(group.id.as_str(), group);
                    valid_groups.push(group);
                }
                Err(err) => {
                    warn!(error = %err, "skipping holding group");
                    errors.report(err);
                }
            }
        }

        let mut entries = Vec::with_capacity(input.copies.len());
        let mut covered: HashSet<&str> = HashSet::new();

        for (index, copy) in input.copies.iter().enumerate() {
            if let Err(err) = validate_copy(index, copy) {
                warn!(error = %err, "skipping copy");
                errors.report(err);
                continue;
            }

            let group = copy
                .holding_group_id
                .as_deref()
                .and_then(|id| groups.get(id).copied());

            if group.is_some_and(|g| g.suppressed) {
                debug!(item_id = %copy.item_id, "dropping copy of suppressed holding");
                continue;
            }

            if let Some(process_type) = copy.process_type.as_deref() {
                if self.config.is_hidden(copy.format.as_deref(), process_type) {
                    debug!(
                        item_id = %copy.item_id,
                        process_type,
                        "dropping copy with hidden process type"
                    );
                    continue;
                }
            }

            let classification = match self
                .classifier
                .classify(copy.raw_status_signals.as_slice(), copy.available)
            {
                Ok(classification) => classification,
                Err(source) => {
                    let err = NormalizationError::Classification {
                        item_id: copy.item_id.clone(),
                        source,
                    };
                    warn!(error = %err, "skipping unclassifiable copy");
                    errors.report(err);
                    continue;
                }
            };

            if let Some(group) = group {
                covered.insert(group.id.as_str());
            }
            let sort_key = entries.len();
            entries.push(self.copy_entry(input, copy, group, classification, sort_key));
        }

        for group in valid_groups {
            if group.suppressed || covered.contains(group.id.as_str()) {
                continue;
            }
            debug!(holding_group_id = %group.id, "synthesizing placeholder");
            let sort_key = entries.len();
            entries.push(self.placeholder_entry(&input.bib_id, group, sort_key));
        }

        entries
    }

    fn copy_entry(
        &self,
        input: &NormalizeInput,
        copy: &CopyRecord,
        group: Option<&HoldingGroup>,
        classification: Classification,
        sort_key: usize,
    ) -> HoldingEntry {
        let location_name = copy
            .location_name
            .as_deref()
            .or_else(|| group.and_then(|g| g.location_name.as_deref()));
        let call_number = copy
            .call_number
            .as_deref()
            .or_else(|| group.and_then(|g| g.call_number.as_deref()))
            .unwrap_or_default();

        let (location_label, call_number) = match &copy.location_label {
            Some(label) => (
                label.clone(),
                self.prefixed_call_number(location_name, call_number),
            ),
            None => self.resolve_location(&copy.library_id, location_name, call_number),
        };

        let mut notes = copy.notes.clone();
        if let Some(group) = group {
            notes.extend(group.notes.iter().cloned());
        }

        HoldingEntry {
            id: input.bib_id.clone(),
            item_id: copy.item_id.clone(),
            holding_group_id: copy.holding_group_id.clone(),
            available: classification.available,
            status: classification.status,
            location_label,
            location_code: copy
                .location_id
                .clone()
                .or_else(|| group.and_then(|g| g.location_id.clone())),
            branch_code: copy.library_id.clone(),
            call_number,
            due_date: copy.due_date,
            requests_placed: copy.queue_length.max(input.title_queue_length),
            sort_key,
            enumeration: copy.enumeration.clone(),
            barcode: copy.barcode.clone(),
            department: copy.department.clone(),
            notes,
            detail_pending: false,
        }
    }

    fn placeholder_entry(
        &self,
        bib_id: &str,
        group: &HoldingGroup,
        sort_key: usize,
    ) -> HoldingEntry {
        let (location_label, _) =
            self.resolve_location(&group.library_id, group.location_name.as_deref(), "");

        HoldingEntry {
            id: bib_id.to_string(),
            item_id: format!("{}{}", self.config.placeholder_prefix, group.id),
            holding_group_id: Some(group.id.clone()),
            available: false,
            status: String::new(),
            location_label,
            location_code: group.location_id.clone(),
            branch_code: group.library_id.clone(),
            call_number: String::new(),
            due_date: None,
            requests_placed: 0,
            sort_key,
            enumeration: None,
            barcode: None,
            department: None,
            notes: group.notes.clone(),
            detail_pending: true,
        }
    }

    /// Branch name as the label; the location name goes into the label when
    /// grouping by location, into the call number otherwise.
    fn resolve_location(
        &self,
        library_id: &str,
        location_name: Option<&str>,
        call_number: &str,
    ) -> (String, String) {
        let branch = self.branches.name(library_id);
        match location_name {
            Some(location) if self.config.group_by_location => {
                (format!("{branch}, {location}"), call_number.to_string())
            }
            _ => (
                branch.to_string(),
                self.prefixed_call_number(location_name, call_number),
            ),
        }
    }

    fn prefixed_call_number(&self, location_name: Option<&str>, call_number: &str) -> String {
        match location_name {
            Some(location) if !self.config.group_by_location && !call_number.is_empty() => {
                format!("{location}, {call_number}")
            }
            Some(location) if !self.config.group_by_location => location.to_string(),
            _ => call_number.to_string(),
        }
    }
}

fn validate_copy(index: usize, copy: &CopyRecord) -> Result<(), NormalizationError> {
    if copy.item_id.trim().is_empty() {
        return Err(NormalizationError::missing(format!("copy #{index}"), "itemId"));
    }
    if copy.library_id.trim().is_empty() {
        return Err(NormalizationError::missing(
            format!("copy {}", copy.item_id),
            "libraryId",
        ));
    }
    Ok(())
}

fn validate_group(index: usize, group: &HoldingGroup) -> Result<(), NormalizationError> {
    if group.id.trim().is_empty() {
        return Err(NormalizationError::missing(
            format!("holding group #{index}"),
            "id",
        ));
    }
    if group.library_id.trim().is_empty() {
        return Err(NormalizationError::missing(
            format!("holding group {}", group.id),
            "libraryId",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn normalizer(config: NormalizerConfig) -> HoldingNormalizer {
        HoldingNormalizer::new(config, StatusClassifier::default())
            .with_branches(BranchDirectory::new().with_branch("MAIN", "Main Library"))
    }

    #[test]
    fn test_sort_keys_follow_output_order() {
        let input = NormalizeInput::new("bib1")
            .with_copy(CopyRecord::new("i1", "MAIN").with_status("Available"))
            .with_copy(CopyRecord::new("i2", "WEST").with_status("Charged"))
            .with_group(HoldingGroup::new("h9", "EAST"));

        let mut errors: Vec<NormalizationError> = Vec::new();
        let entries = normalizer(NormalizerConfig::default()).normalize(&input, &mut errors);

        assert!(errors.is_empty());
        let keys: Vec<usize> = entries.iter().map(|e| e.sort_key).collect();
        assert_eq!(keys, vec![0, 1, 2]);
        assert_eq!(entries[0].location_label, "Main Library");
        assert_eq!(entries[1].location_label, "WEST");
        assert!(entries[2].detail_pending);
    }

    #[test]
    fn test_hidden_process_types_dropped() {
        let mut hidden = HashMap::new();
        hidden.insert("*".to_string(), vec!["WITHDRAWN".to_string()]);
        hidden.insert("DVD".to_string(), vec!["REPAIR".to_string()]);
        let config = NormalizerConfig {
            hidden_process_types: hidden,
            ..Default::default()
        };

        let copy = |id: &str, format: &str, process_type: &str| {
            CopyRecord::new(id, "MAIN")
                .with_status("Available")
                .with_process_type(format, process_type)
        };
        let input = NormalizeInput::new("bib1")
            .with_copy(copy("i1", "BOOK", "WITHDRAWN"))
            .with_copy(copy("i2", "DVD", "REPAIR"))
            .with_copy(copy("i3", "BOOK", "REPAIR"));

        let mut errors: Vec<NormalizationError> = Vec::new();
        let entries = normalizer(config).normalize(&input, &mut errors);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_id, "i3");
        assert_eq!(entries[0].sort_key, 0);
    }

    #[test]
    fn test_suppressed_group_hides_copies_and_placeholder() {
        let input = NormalizeInput::new("bib1")
            .with_group(HoldingGroup::new("h1", "MAIN").suppressed())
            .with_copy(CopyRecord::new("i1", "MAIN").in_group("h1").with_status("Available"));

        let mut errors: Vec<NormalizationError> = Vec::new();
        let entries = normalizer(NormalizerConfig::default()).normalize(&input, &mut errors);
        assert!(entries.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_placeholder_for_group_without_surviving_copies() {
        let config = NormalizerConfig {
            hidden_process_types: [("*".to_string(), vec!["LOST".to_string()])]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let input = NormalizeInput::new("bib1")
            .with_group(
                HoldingGroup::new("h1", "MAIN")
                    .with_call_number("822 SMI")
                    .with_note("Ask at desk"),
            )
            .with_copy(
                CopyRecord::new("i1", "MAIN")
                    .in_group("h1")
                    .with_status("Available")
                    .with_process_type("BOOK", "LOST"),
            );

        let mut errors: Vec<NormalizationError> = Vec::new();
        let entries = normalizer(config).normalize(&input, &mut errors);
        assert_eq!(entries.len(), 1);

        let placeholder = &entries[0];
        assert_eq!(placeholder.item_id, "HLD_h1");
        assert!(placeholder.is_placeholder());
        assert!(!placeholder.available);
        assert_eq!(placeholder.status, "");
        assert_eq!(placeholder.call_number, "");
        assert_eq!(placeholder.requests_placed, 0);
        assert_eq!(placeholder.notes, vec!["Ask at desk"]);
    }

    #[test]
    fn test_bad_records_reported_and_skipped() {
        let input = NormalizeInput::new("bib1")
            .with_copy(CopyRecord::new("", "MAIN").with_status("Available"))
            .with_copy(CopyRecord::new("i2", "MAIN"))
            .with_copy(CopyRecord::new("i3", "MAIN").with_status("Available"));

        let mut errors: Vec<NormalizationError> = Vec::new();
        let entries = normalizer(NormalizerConfig::default()).normalize(&input, &mut errors);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_id, "i3");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], NormalizationError::missing("copy #0", "itemId"));
        assert!(matches!(
            &errors[1],
            NormalizationError::Classification { item_id, .. } if item_id == "i2"
        ));
    }

    #[test]
    fn test_location_grouping() {
        let copy = CopyRecord::new("i1", "MAIN")
            .with_status("Available")
            .with_location_name("Stacks")
            .with_call_number("822 SMI");
        let input = NormalizeInput::new("bib1").with_copy(copy);
        let mut errors: Vec<NormalizationError> = Vec::new();

        let entries = normalizer(NormalizerConfig::default()).normalize(&input, &mut errors);
        assert_eq!(entries[0].location_label, "Main Library");
        assert_eq!(entries[0].call_number, "Stacks, 822 SMI");

        let grouped = NormalizerConfig {
            group_by_location: true,
            ..Default::default()
        };
        let entries = normalizer(grouped).normalize(&input, &mut errors);
        assert_eq!(entries[0].location_label, "Main Library, Stacks");
        assert_eq!(entries[0].call_number, "822 SMI");
    }

    #[test]
    fn test_group_data_merged_into_copy() {
        let input = NormalizeInput::new("bib1")
            .with_title_queue(4)
            .with_group(
                HoldingGroup::new("h1", "MAIN")
                    .at_location("REF")
                    .with_call_number("030 ENC")
                    .with_note("Reference only"),
            )
            .with_copy(
                CopyRecord::new("i1", "MAIN")
                    .in_group("h1")
                    .with_status("Available")
                    .with_queue(2),
            );

        let mut errors: Vec<NormalizationError> = Vec::new();
        let entries = normalizer(NormalizerConfig::default()).normalize(&input, &mut errors);
        let entry = &entries[0];
        assert_eq!(entry.call_number, "030 ENC");
        assert_eq!(entry.location_code.as_deref(), Some("REF"));
        assert_eq!(entry.notes, vec!["Reference only"]);
        assert_eq!(entry.requests_placed, 4);
        assert_eq!(entry.id, "bib1");
    }
}
