//! Status classification.
//!
//! A copy can carry several status flags at once (in transit and on hold,
//! say). The classifier picks the single status to display and decides
//! whether the copy is available.

use holdshelf_core::{ClassificationError, StatusConfig};
use std::collections::{HashMap, HashSet};

/// Availability and display status of one copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub available: bool,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct StatusClassifier {
    rankings: HashMap<String, i32>,
    default_rank: i32,
    available_statuses: HashSet<String>,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::from_config(&StatusConfig::default())
    }
}

impl StatusClassifier {
    pub fn from_config(config: &StatusConfig) -> Self {
        Self {
            rankings: config.effective_rankings(),
            default_rank: config.default_rank,
            available_statuses: config.available_statuses.iter().cloned().collect(),
        }
    }

    /// Lower is more important.
    pub fn rank(&self, status: &str) -> i32 {
        self.rankings
            .get(status)
            .copied()
            .unwrap_or(self.default_rank)
    }

    /// The most important signal. Ties keep the earliest signal.
    pub fn pick_status<'a, S: AsRef<str>>(&self, signals: &'a [S]) -> Option<&'a str> {
        signals
            .iter()
            .map(AsRef::as_ref)
            .min_by_key(|status| self.rank(status))
    }

    /// Classify one copy. `backend_available` wins over status membership
    /// when the backend reports it.
    pub fn classify<S: AsRef<str>>(
        &self,
        signals: &[S],
        backend_available: Option<bool>,
    ) -> Result<Classification, ClassificationError> {
        let status = self
            .pick_status(signals)
            .ok_or(ClassificationError::NoSignals)?;

        let available = backend_available
            .unwrap_or_else(|| self.available_statuses.contains(status));

        Ok(Classification {
            available,
            status: status.to_string(),
        })
    }
}
