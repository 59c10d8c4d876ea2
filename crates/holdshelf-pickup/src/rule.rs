//! Pickup rules
//!
//! A rule is a predicate over the requested copies, the hold level and the
//! patron group, plus the pickup locations it grants when it matches.

use crate::engine::CandidateCopy;
use holdshelf_core::RuleParseErrorKind;
use regex::{Regex, RegexBuilder};
use std::fmt;

/// One matcher pattern. A leading `!` negates it.
///
/// The pattern text is regex syntax, anchored and case-insensitive, so
/// `MAIN.*` matches every location starting with "main".
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    negated: bool,
    regex: Regex,
}

impl Pattern {
    pub fn compile(text: &str) -> Result<Self, RuleParseErrorKind> {
        let (negated, source) = match text.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let invalid = |e: regex::Error| RuleParseErrorKind::InvalidPattern {
            pattern: text.to_string(),
            message: e.to_string(),
        };
        // The source must parse on its own before it is anchored, or an
        // unbalanced `)` could close the anchoring group.
        Regex::new(source).map_err(invalid)?;
        let regex = RegexBuilder::new(&format!("^(?:{source})$"))
            .case_insensitive(true)
            .build()
            .map_err(invalid)?;

        Ok(Self {
            source: source.to_string(),
            negated,
            regex,
        })
    }

    /// Pattern text without the negation prefix
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Full match against `value`, ignoring negation.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.negated == other.negated && self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }
        f.write_str(&self.source)
    }
}

/// The patterns of one matcher field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet(Vec<Pattern>);

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self, RuleParseErrorKind> {
        let mut set = Self::new();
        for pattern in patterns {
            set.push(Pattern::compile(pattern.as_ref())?);
        }
        Ok(set)
    }

    pub fn push(&mut self, pattern: Pattern) {
        self.0.push(pattern);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.0.iter()
    }

    /// Whether the set accepts `values`.
    ///
    /// With at least one positive pattern: true iff some positive pattern
    /// matches some value, and negated patterns are not consulted at all.
    /// Otherwise: true iff no negated pattern matches any value. An empty
    /// set accepts everything.
    pub fn matches(&self, values: &[&str]) -> bool {
        let hits = |p: &Pattern| values.iter().any(|v| p.is_match(v));

        let mut positives = self.0.iter().filter(|p| !p.negated).peekable();
        if positives.peek().is_some() {
            return positives.any(hits);
        }
        !self.0.iter().any(hits)
    }
}

impl Extend<Pattern> for PatternSet {
    fn extend<I: IntoIterator<Item = Pattern>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// `lib`/`loc`/`policy` criteria applied to one subset of the copies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCriteria {
    /// Library ids, compared exactly
    pub lib: Vec<String>,
    pub loc: PatternSet,
    pub policy: PatternSet,
}

impl ItemCriteria {
    pub fn is_empty(&self) -> bool {
        self.lib.is_empty() && self.loc.is_empty() && self.policy.is_empty()
    }

    /// True iff one copy satisfies every non-empty criterion.
    pub fn matches(&self, copies: &[CandidateCopy]) -> bool {
        copies.iter().any(|copy| {
            (self.lib.is_empty() || self.lib.iter().any(|lib| *lib == copy.library_id))
                && (self.loc.is_empty() || self.loc.matches(&[copy.location()]))
                && (self.policy.is_empty() || self.policy.matches(&[copy.policy()]))
        })
    }
}

/// A parsed pickup rule. Empty fields place no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupRule {
    pub level: PatternSet,
    /// Checked against every copy
    pub items: ItemCriteria,
    /// Checked against available copies only
    pub available: ItemCriteria,
    /// Checked against unavailable copies only
    pub unavailable: ItemCriteria,
    pub group: PatternSet,
    /// Location ids granted on match
    pub pickup: Vec<String>,
    pub home: Option<bool>,
    pub work: Option<bool>,
    pub stop: bool,
    /// Keys this engine does not evaluate, in first-seen order
    pub extra: Vec<(String, Vec<String>)>,
}

impl PickupRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn granting(mut self, location_id: impl Into<String>) -> Self {
        self.pickup.push(location_id.into());
        self
    }

    pub fn stopping(mut self) -> Self {
        self.stop = true;
        self
    }

    pub fn extra(&self, key: &str) -> Option<&[String]> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }
}

/// Rules in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<PickupRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<PickupRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PickupRule> {
        self.rules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PickupRule> {
        self.rules.get(index)
    }
}

impl FromIterator<PickupRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = PickupRule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
