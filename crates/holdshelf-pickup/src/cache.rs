//! Parsed-rule cache
//!
//! Parsing is deterministic, so a rule list only needs parsing once per
//! distinct text. Entries are keyed by a blake3 digest of the lines and
//! shared read-only across threads.

use crate::parser::parse_rules;
use crate::rule::RuleSet;
use holdshelf_core::RuleParseError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

type Digest = [u8; 32];

#[derive(Debug, Default)]
pub struct RuleCache {
    entries: RwLock<HashMap<Digest, Arc<RuleSet>>>,
}

impl RuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached rules for `lines`, parsing them on first use. Parse failures
    /// are not cached.
    pub fn get_or_parse<S: AsRef<str>>(&self, lines: &[S]) -> Result<Arc<RuleSet>, RuleParseError> {
        let key = digest(lines);

        if let Some(rules) = self.entries.read().get(&key) {
            trace!(rules = rules.len(), "rule cache hit");
            return Ok(Arc::clone(rules));
        }

        trace!(lines = lines.len(), "rule cache miss");
        let parsed = Arc::new(parse_rules(lines)?);
        let mut entries = self.entries.write();
        Ok(Arc::clone(entries.entry(key).or_insert(parsed)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

// Length prefixes keep ["a:b"] and ["a", ":b"] apart.
fn digest<S: AsRef<str>>(lines: &[S]) -> Digest {
    let mut hasher = blake3::Hasher::new();
    for line in lines {
        let line = line.as_ref().as_bytes();
        hasher.update(&(line.len() as u64).to_le_bytes());
        hasher.update(line);
    }
    *hasher.finalize().as_bytes()
}
