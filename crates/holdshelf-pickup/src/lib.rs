//! Holdshelf Pickup: where may a patron collect a hold?
//!
//! Pickup rules are configured as text lines, parsed once into a [`RuleSet`]
//! and evaluated per hold request against the requested copies.
//!
//! # Architecture
//!
//! ```text
//! rule lines ──parse──▶ RuleSet ──┐
//!                 (RuleCache)     │
//! CopyRecord[] ──classify──▶ CandidateCopy[] ──evaluate──▶ Eligibility
//!                                                               │
//! location catalog ─────────────────────────────────────▶ PickupOptions
//!                                               (exclude, order, home/work)
//! ```
//!
//! # Example
//!
//! ```
//! use holdshelf_core::{CopyRecord, HoldLevel, PickupConfig, PickupLocation};
//! use holdshelf_holdings::StatusClassifier;
//! use holdshelf_pickup::{PickupEngine, PickupRequest};
//!
//! let config = PickupConfig {
//!     rules: vec![
//!         "avail=STACKS:pickup=MAIN,WEST".to_string(),
//!         "group=STAFF:pickup=STAFFROOM:stop=1".to_string(),
//!     ],
//!     ..Default::default()
//! };
//! let engine = PickupEngine::new(&config, StatusClassifier::default()).unwrap();
//!
//! let copies = vec![CopyRecord::new("i1", "MAIN")
//!     .at_location("STACKS")
//!     .with_status("Available")];
//! let catalog = vec![
//!     PickupLocation::new("WEST", "West Branch"),
//!     PickupLocation::new("MAIN", "Main Library"),
//!     PickupLocation::new("EAST", "East Branch"),
//! ];
//!
//! let request = PickupRequest::new(HoldLevel::Copy);
//! let options = engine.pickup_options(&copies, &request, &catalog);
//! assert_eq!(options.ids(), vec!["MAIN", "WEST"]);
//! assert!(!options.is_valid("EAST"));
//! ```

pub mod cache;
pub mod engine;
pub mod locations;
pub mod parser;
pub mod rule;
pub mod serializer;

pub use cache::RuleCache;
pub use engine::{evaluate, CandidateCopy, Eligibility, PickupRequest};
pub use locations::{PickupKind, PickupOption, PickupOptions, HOME_ADDRESS_ID, WORK_ADDRESS_ID};
pub use parser::{parse_rule, parse_rules};
pub use rule::{ItemCriteria, Pattern, PatternSet, PickupRule, RuleSet};

use holdshelf_core::{CopyRecord, HoldshelfConfig, PickupConfig, PickupLocation, RuleParseError};
use holdshelf_holdings::StatusClassifier;
use std::sync::Arc;

/// Parsed rules plus the settings needed to turn a request into options.
#[derive(Debug, Clone)]
pub struct PickupEngine {
    rules: Arc<RuleSet>,
    config: PickupConfig,
    classifier: StatusClassifier,
}

impl PickupEngine {
    /// Parse `config.rules`. Any malformed line fails the whole engine.
    pub fn new(
        config: &PickupConfig,
        classifier: StatusClassifier,
    ) -> Result<Self, RuleParseError> {
        let rules = Arc::new(parse_rules(config.rules.as_slice())?);
        Ok(Self::with_rules(rules, config, classifier))
    }

    /// Like [`PickupEngine::new`], reusing rules already parsed into `cache`.
    pub fn cached(
        config: &PickupConfig,
        classifier: StatusClassifier,
        cache: &RuleCache,
    ) -> Result<Self, RuleParseError> {
        let rules = cache.get_or_parse(config.rules.as_slice())?;
        Ok(Self::with_rules(rules, config, classifier))
    }

    pub fn from_config(config: &HoldshelfConfig) -> Result<Self, RuleParseError> {
        Self::new(&config.pickup, StatusClassifier::from_config(&config.status))
    }

    pub fn with_rules(
        rules: Arc<RuleSet>,
        config: &PickupConfig,
        classifier: StatusClassifier,
    ) -> Self {
        Self {
            rules,
            config: config.clone(),
            classifier,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn candidates(&self, copies: &[CopyRecord]) -> Vec<CandidateCopy> {
        copies
            .iter()
            .map(|copy| CandidateCopy::from_record(copy, &self.classifier))
            .collect()
    }

    pub fn evaluate(&self, copies: &[CopyRecord], request: &PickupRequest) -> Eligibility {
        evaluate(&self.rules, &self.candidates(copies), request)
    }

    /// Ordered options for the hold form; also used to validate a chosen
    /// location before the hold is placed.
    pub fn pickup_options(
        &self,
        copies: &[CopyRecord],
        request: &PickupRequest,
        catalog: &[PickupLocation],
    ) -> PickupOptions {
        let eligibility = self.evaluate(copies, request);
        PickupOptions::build(catalog, &eligibility, request, &self.config)
    }
}
