//! Cross-bookmaker event matching.
//!
//! Every row of a reference table is paired with the most similar row of
//! another bookmaker's table. For three or more bookmakers the matching is
//! chained: the label matched in the second table is what gets matched in
//! the third, and so on. Acceptance against the threshold happens when the
//! chain is joined (see [`crate::candidates`]), not here.

use tracing::trace;

use crate::similarity::{SimilarityScorer, TokenSetRatio};
use crate::types::NormalizedRow;

// =============================================================================
// Match Results
// =============================================================================

/// Best match for one label within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch {
    /// Row index in the candidate table.
    pub index: usize,
    /// Similarity score (0-100).
    pub score: u8,
}

/// A chain of matches starting from one reference row.
///
/// `indices[t]` is the matched row in table `t` (with `indices[0]` the
/// reference row) and `scores[t]` is the similarity between the labels at
/// `t` and `t + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMatch {
    /// Row index per table.
    pub indices: Vec<usize>,
    /// Similarity per link of the chain.
    pub scores: Vec<u8>,
}

impl ChainMatch {
    /// Returns true if every link scores strictly above `threshold`.
    #[must_use]
    pub fn exceeds_threshold(&self, threshold: u8) -> bool {
        self.scores.iter().all(|&score| score > threshold)
    }
}

// =============================================================================
// Entity Matcher
// =============================================================================

/// Matches event labels across bookmakers using a pluggable scorer.
#[derive(Debug, Clone, Default)]
pub struct EntityMatcher<S = TokenSetRatio> {
    scorer: S,
}

impl EntityMatcher<TokenSetRatio> {
    /// Creates a matcher using token-set ratio similarity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scorer: TokenSetRatio,
        }
    }
}

impl<S: SimilarityScorer> EntityMatcher<S> {
    /// Creates a matcher with a custom scorer.
    #[must_use]
    pub fn with_scorer(scorer: S) -> Self {
        Self { scorer }
    }

    /// Returns the scorer.
    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Finds the candidate row whose label is most similar to `label`.
    ///
    /// Ties resolve to the first maximum. Returns `None` only for an empty table.
    #[must_use]
    pub fn best_match(&self, label: &str, candidates: &[NormalizedRow]) -> Option<LabelMatch> {
        let mut best: Option<LabelMatch> = None;

        for (index, row) in candidates.iter().enumerate() {
            let score = self.scorer.score(label, &row.label);
            if best.map_or(true, |b| score > b.score) {
                best = Some(LabelMatch { index, score });
            }
        }

        best
    }

    /// Matches every reference row against the candidate table.
    #[must_use]
    pub fn match_rows(
        &self,
        reference: &[NormalizedRow],
        candidates: &[NormalizedRow],
    ) -> Vec<Option<LabelMatch>> {
        reference
            .iter()
            .map(|row| self.best_match(&row.label, candidates))
            .collect()
    }

    /// Chains matches through `tables`, starting from each row of `tables[0]`.
    ///
    /// Each step matches the label found in the previous table. Returns one
    /// chain per reference row, or nothing if any table is empty.
    #[must_use]
    pub fn match_chain(&self, tables: &[&[NormalizedRow]]) -> Vec<ChainMatch> {
        let Some((reference, rest)) = tables.split_first() else {
            return Vec::new();
        };
        if rest.iter().any(|table| table.is_empty()) {
            return Vec::new();
        }

        let mut chains = Vec::with_capacity(reference.len());

        for (start, row) in reference.iter().enumerate() {
            let mut indices = Vec::with_capacity(tables.len());
            let mut scores = Vec::with_capacity(rest.len());
            indices.push(start);
            let mut label = row.label.as_str();

            for table in rest {
                let Some(found) = self.best_match(label, table) else {
                    break;
                };
                indices.push(found.index);
                scores.push(found.score);
                label = table[found.index].label.as_str();
            }

            trace!(
                reference = %row.label,
                matched = %label,
                scores = ?scores,
                "Chained match"
            );

            chains.push(ChainMatch { indices, scores });
        }

        chains
    }
}
