//! Holdshelf Holdings: classify, normalize and rank a title's holdings
//!
//! ```ignore
//! use holdshelf_holdings::{HoldingsEngine, NormalizeInput};
//!
//! let engine = HoldingsEngine::from_config(&config);
//! let mut errors = Vec::new();
//! let rows = engine.process(&input, &mut errors).into_rows();
//! ```

pub mod classifier;
pub mod natural;
pub mod normalizer;
pub mod ranking;

pub use classifier::{Classification, StatusClassifier};
pub use natural::natural_cmp;
pub use normalizer::{HoldingNormalizer, NormalizeInput};
pub use ranking::{HoldingsRanker, RankedHoldings};

use holdshelf_core::{ErrorSink, HoldshelfConfig};

/// Normalizer and ranker wired from one deployment configuration.
#[derive(Debug, Clone, Default)]
pub struct HoldingsEngine {
    normalizer: HoldingNormalizer,
    ranker: HoldingsRanker,
}

impl HoldingsEngine {
    pub fn new(normalizer: HoldingNormalizer, ranker: HoldingsRanker) -> Self {
        Self { normalizer, ranker }
    }

    pub fn from_config(config: &HoldshelfConfig) -> Self {
        let classifier = StatusClassifier::from_config(&config.status);
        let normalizer = HoldingNormalizer::new(config.normalizer.clone(), classifier)
            .with_branches(config.branches.clone());
        Self::new(normalizer, HoldingsRanker::new(config.ranking.clone()))
    }

    pub fn normalizer(&self) -> &HoldingNormalizer {
        &self.normalizer
    }

    pub fn ranker(&self) -> &HoldingsRanker {
        &self.ranker
    }

    /// Normalize then rank. Per-record failures land in `errors`.
    pub fn process(&self, input: &NormalizeInput, errors: &mut impl ErrorSink) -> RankedHoldings {
        let entries = self.normalizer.normalize(input, errors);
        self.ranker.rank(entries)
    }
}
