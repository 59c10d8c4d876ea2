//! Holdshelf Core: Data Model, Errors and Configuration
//!
//! Backend-independent types shared by the holdings pipeline and the
//! pickup-rule engine.

pub mod config;
pub mod data_model;
pub mod error;

pub use config::{
    HoldshelfConfig, NormalizerConfig, OrderTable, PickupConfig, PickupOrder, RankingConfig,
    StatusConfig, DEFAULT_STATUS_RANK,
};
pub use data_model::{
    BranchDirectory, CopyRecord, HoldLevel, HoldingEntry, HoldingGroup, HoldingsRow,
    PickupLocation, SummaryEntry, SUMMARY_LOCATION,
};
pub use error::{
    ClassificationError, ConfigError, Error, ErrorSink, NormalizationError, RuleParseError,
    RuleParseErrorKind,
};

/// Holdshelf engine version
pub const HOLDSHELF_VERSION: &str = env!("CARGO_PKG_VERSION");
