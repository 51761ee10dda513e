//! Candidate set construction.
//!
//! For a market with K outcomes every unordered group of K bookmakers is
//! considered once. Within a group the entity matcher chains the tables
//! together; chains whose links all clear the threshold are joined into
//! candidates carrying the full K x K odds matrix.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use surebet_core::DEFAULT_MATCH_THRESHOLD;

use crate::matcher::EntityMatcher;
use crate::similarity::{SimilarityScorer, TokenSetRatio};
use crate::types::{Candidate, ComboKey, EventMember, MatchedEventGroup, NormalizedRow};

/// Normalized rows per bookmaker for one market.
pub type NormalizedTables = BTreeMap<String, Vec<NormalizedRow>>;

/// Builds candidates from normalized tables.
#[derive(Debug, Clone)]
pub struct CandidateBuilder<S = TokenSetRatio> {
    matcher: EntityMatcher<S>,
    threshold: u8,
}

impl Default for CandidateBuilder<TokenSetRatio> {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateBuilder<TokenSetRatio> {
    /// Creates a builder with token-set matching and the default threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            matcher: EntityMatcher::new(),
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl<S: SimilarityScorer> CandidateBuilder<S> {
    /// Creates a builder around an existing matcher.
    #[must_use]
    pub fn with_matcher(matcher: EntityMatcher<S>) -> Self {
        Self {
            matcher,
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    /// Sets the acceptance threshold; every chain link must score above it.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Returns the acceptance threshold.
    #[must_use]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Builds candidates for every K-bookmaker combination.
    #[must_use]
    pub fn build(&self, tables: &NormalizedTables, outcome_count: usize) -> Vec<Candidate> {
        let bookmakers: Vec<&str> = tables.keys().map(String::as_str).collect();

        combinations(&bookmakers, outcome_count)
            .iter()
            .flat_map(|combo| self.build_for_combo(combo, tables))
            .collect()
    }

    /// Builds the candidates of a single combination.
    ///
    /// The first (sorted) bookmaker of the combo is the reference table.
    /// Returns nothing if a member is missing or has no rows.
    #[must_use]
    pub fn build_for_combo(&self, combo: &ComboKey, tables: &NormalizedTables) -> Vec<Candidate> {
        let Some(members) = combo
            .bookmakers()
            .iter()
            .map(|bookmaker| tables.get(bookmaker).map(Vec::as_slice))
            .collect::<Option<Vec<&[NormalizedRow]>>>()
        else {
            return Vec::new();
        };

        let chains = self.matcher.match_chain(&members);
        let mut candidates = Vec::new();

        for chain in chains {
            if chain.indices.len() != members.len() || !chain.exceeds_threshold(self.threshold) {
                trace!(
                    combo = %combo,
                    reference = %members[0][chain.indices[0]].label,
                    scores = ?chain.scores,
                    "Chain rejected"
                );
                continue;
            }

            let rows: Vec<&NormalizedRow> = chain
                .indices
                .iter()
                .zip(&members)
                .map(|(&index, table)| &table[index])
                .collect();

            let event = MatchedEventGroup {
                members: combo
                    .bookmakers()
                    .iter()
                    .zip(&rows)
                    .map(|(bookmaker, row)| EventMember {
                        bookmaker: bookmaker.clone(),
                        label: row.label.clone(),
                    })
                    .collect(),
                scores: chain.scores,
            };

            candidates.push(Candidate::from_rows(combo.clone(), event, &rows));
        }

        debug!(
            combo = %combo,
            candidates = candidates.len(),
            "Joined bookmaker tables"
        );

        candidates
    }
}

/// Enumerates unordered K-subsets of bookmakers in lexicographic order.
///
/// Each set is produced once regardless of input order or duplicates.
#[must_use]
pub fn combinations(bookmakers: &[&str], k: usize) -> Vec<ComboKey> {
    let n = bookmakers.len();
    if k == 0 || k > n {
        return Vec::new();
    }

    let mut seen = BTreeSet::new();
    let mut combos = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();

    loop {
        let key = ComboKey::new(indices.iter().map(|&i| bookmakers[i]));
        let distinct = key.bookmakers().windows(2).all(|w| w[0] != w[1]);
        if distinct && seen.insert(key.clone()) {
            combos.push(key);
        }

        // Advance the rightmost index that still has room.
        let Some(pos) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
            break;
        };
        indices[pos] += 1;
        for i in pos + 1..k {
            indices[i] = indices[i - 1] + 1;
        }
    }

    combos
}
