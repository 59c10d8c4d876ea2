//! Unified Error Model
//!
//! Every failure in the engine is deterministic and derived from its input.
//! The per-stage error types below are unified by [`Error`] so callers can
//! propagate across crates with `?`.
use thiserror::Error;

/// The classifier was handed nothing to classify.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("no status signals to classify")]
    NoSignals,
}

/// A single copy or holding record could not be normalized.
///
/// Never fatal for a batch: the normalizer reports it to an
/// [`ErrorSink`](crate::ErrorSink) and moves on to the next record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("{record}: missing required field `{field}`")]
    MissingField { record: String, field: &'static str },

    #[error("item {item_id}: {source}")]
    Classification {
        item_id: String,
        #[source]
        source: ClassificationError,
    },
}

impl NormalizationError {
    pub fn missing(record: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            record: record.into(),
            field,
        }
    }
}

/// Receives per-record failures during a batch so processing can continue.
pub trait ErrorSink {
    fn report(&mut self, error: NormalizationError);
}

impl ErrorSink for Vec<NormalizationError> {
    fn report(&mut self, error: NormalizationError) {
        self.push(error);
    }
}

/// A pickup rule line could not be parsed. Fatal for the whole rule set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pickup rule {index}: {kind} in `{rule}`")]
pub struct RuleParseError {
    /// 0-based position of the offending line in the configured list
    pub index: usize,
    /// The offending line, verbatim
    pub rule: String,
    pub kind: RuleParseErrorKind,
}

impl RuleParseError {
    pub fn new(index: usize, rule: impl Into<String>, kind: RuleParseErrorKind) -> Self {
        Self {
            index,
            rule: rule.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseErrorKind {
    #[error("unbalanced quote starting at byte {0}")]
    UnbalancedQuote(usize),

    #[error("dangling escape at byte {0}")]
    DanglingEscape(usize),

    #[error("unexpected `{found}` at byte {at}")]
    UnexpectedCharacter { found: char, at: usize },

    #[error("clause `{0}` has no `=`")]
    MissingEquals(String),

    #[error("empty key")]
    EmptyKey,

    #[error("invalid boolean `{value}` for `{key}`")]
    InvalidBoolean { key: String, value: String },

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Configuration could not be read into its typed form.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid order list element `{element}`: {message}")]
    InvalidOrder { element: String, message: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("CLASSIFY/{0}")]
    Classification(#[from] ClassificationError),

    #[error("NORMALIZE/{0}")]
    Normalization(#[from] NormalizationError),

    #[error("RULE/{0}")]
    RuleParse(#[from] RuleParseError),

    #[error("CONFIG/{0}")]
    Config(#[from] ConfigError),
}
