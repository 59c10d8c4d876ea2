//! Rule evaluation
//!
//! Rules are walked in configuration order. Every matching rule adds its
//! pickup locations to the eligible set; a matching `stop` rule ends the walk.
//! When nothing matches, nothing is eligible.

use crate::rule::{PickupRule, RuleSet};
use holdshelf_core::{CopyRecord, HoldLevel};
use holdshelf_holdings::StatusClassifier;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, debug_span, warn};

/// The parts of a copy the pickup rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCopy {
    pub library_id: String,
    pub location_id: Option<String>,
    pub policy_id: Option<String>,
    pub available: bool,
}

impl CandidateCopy {
    pub fn new(library_id: impl Into<String>, available: bool) -> Self {
        Self {
            library_id: library_id.into(),
            location_id: None,
            policy_id: None,
            available,
        }
    }

    pub fn at_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    pub fn with_policy(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    /// Availability comes from the classifier. A copy that cannot be
    /// classified counts as unavailable.
    pub fn from_record(copy: &CopyRecord, classifier: &StatusClassifier) -> Self {
        let signals = copy.raw_status_signals.as_slice();
        let available = match classifier.classify(signals, copy.available) {
            Ok(classification) => classification.available,
            Err(err) => {
                warn!(
                    item_id = %copy.item_id,
                    error = %err,
                    "treating unclassifiable copy as unavailable"
                );
                false
            }
        };
        Self {
            library_id: copy.library_id.clone(),
            location_id: copy.location_id.clone(),
            policy_id: copy.policy_id.clone(),
            available,
        }
    }

    /// Location id, empty when unknown
    pub fn location(&self) -> &str {
        self.location_id.as_deref().unwrap_or_default()
    }

    /// Policy id, empty when unknown
    pub fn policy(&self) -> &str {
        self.policy_id.as_deref().unwrap_or_default()
    }
}

/// Who is asking, and for what.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupRequest {
    pub level: HoldLevel,
    pub patron_group: Option<String>,
    pub home_address: Option<String>,
    pub work_address: Option<String>,
}

impl PickupRequest {
    pub fn new(level: HoldLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn for_group(mut self, group: impl Into<String>) -> Self {
        self.patron_group = Some(group.into());
        self
    }

    pub fn with_home_address(mut self, address: impl Into<String>) -> Self {
        self.home_address = Some(address.into());
        self
    }

    pub fn with_work_address(mut self, address: impl Into<String>) -> Self {
        self.work_address = Some(address.into());
        self
    }
}

/// Outcome of walking the rules for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    /// `None` until a rule matches
    pub pickup: Option<BTreeSet<String>>,
    pub home: bool,
    pub work: bool,
    /// Indexes of the matching rules
    pub matched_rules: Vec<usize>,
    pub stopped_at: Option<usize>,
}

impl Eligibility {
    pub fn any_rule_matched(&self) -> bool {
        self.pickup.is_some()
    }

    pub fn allows(&self, location_id: &str) -> bool {
        self.pickup
            .as_ref()
            .is_some_and(|ids| ids.contains(location_id))
    }

    /// Eligible location ids; empty when no rule matched.
    pub fn location_ids(&self) -> impl Iterator<Item = &str> {
        self.pickup.iter().flatten().map(String::as_str)
    }
}

/// Evaluate `rules` for a request over the requested copies.
pub fn evaluate(
    rules: &RuleSet,
    copies: &[CandidateCopy],
    request: &PickupRequest,
) -> Eligibility {
    let span = debug_span!("evaluate", rules = rules.len(), copies = copies.len());
    let _enter = span.enter();

    let (available, unavailable): (Vec<CandidateCopy>, Vec<CandidateCopy>) =
        copies.iter().cloned().partition(|c| c.available);
    let level = request.level.as_str();
    let group = request.patron_group.as_deref().unwrap_or_default();

    let mut eligibility = Eligibility::default();

    for (index, rule) in rules.iter().enumerate() {
        if !rule_matches(rule, copies, &available, &unavailable, level, group) {
            continue;
        }

        debug!(rule = index, stop = rule.stop, "pickup rule matched");
        eligibility.matched_rules.push(index);
        eligibility
            .pickup
            .get_or_insert_with(BTreeSet::new)
            .extend(rule.pickup.iter().cloned());
        if let Some(home) = rule.home {
            eligibility.home = home && request.home_address.is_some();
        }
        if let Some(work) = rule.work {
            eligibility.work = work && request.work_address.is_some();
        }

        if rule.stop {
            eligibility.stopped_at = Some(index);
            break;
        }
    }

    eligibility
}

fn rule_matches(
    rule: &PickupRule,
    copies: &[CandidateCopy],
    available: &[CandidateCopy],
    unavailable: &[CandidateCopy],
    level: &str,
    group: &str,
) -> bool {
    (rule.level.is_empty() || rule.level.matches(&[level]))
        && (rule.items.is_empty() || rule.items.matches(copies))
        && (rule.available.is_empty() || rule.available.matches(available))
        && (rule.unavailable.is_empty() || rule.unavailable.matches(unavailable))
        && (rule.group.is_empty() || rule.group.matches(&[group]))
}
