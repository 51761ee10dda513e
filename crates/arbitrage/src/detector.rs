//! Outcome assignment enumeration and the arbitrage test.
//!
//! Any bookmaker of a candidate may cover any outcome, so for K outcomes
//! there are K! ways to assign outcomes to bookmakers. An assignment is an
//! arbitrage when the implied probabilities of the chosen odds sum to less
//! than one.

use rust_decimal::Decimal;
use tracing::trace;

use crate::error::{Result, SurebetError};
use crate::types::{Assignment, Candidate};

// =============================================================================
// Implied Probability
// =============================================================================

/// Sum of implied probabilities, Σ 1/odds.
///
/// # Errors
///
/// Returns [`SurebetError::InvalidOdds`] for non-positive odds.
pub fn implied_probability_sum(odds: &[Decimal]) -> Result<Decimal> {
    odds.iter().try_fold(Decimal::ZERO, |sum, &o| {
        if o <= Decimal::ZERO {
            return Err(SurebetError::invalid_odds(o, "implied probability"));
        }
        Decimal::ONE
            .checked_div(o)
            .and_then(|p| sum.checked_add(p))
            .ok_or_else(|| SurebetError::invalid_odds(o, "implied probability overflow"))
    })
}

/// Returns true if backing every outcome at these odds guarantees a profit.
///
/// # Errors
///
/// Returns [`SurebetError::InvalidOdds`] for non-positive odds.
pub fn is_arbitrage_possible(odds: &[Decimal]) -> Result<bool> {
    Ok(implied_probability_sum(odds)? < Decimal::ONE)
}

/// All permutations of `0..k` in lexicographic order.
#[must_use]
pub fn permutations(k: usize) -> Vec<Vec<usize>> {
    let mut current: Vec<usize> = (0..k).collect();
    let mut all = vec![current.clone()];

    while next_permutation(&mut current) {
        all.push(current.clone());
    }

    all
}

/// Rearranges `items` into the next lexicographic permutation.
/// Returns false once the last permutation has been reached.
fn next_permutation(items: &mut [usize]) -> bool {
    let Some(pivot) = items.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(successor) = items.iter().rposition(|&x| x > items[pivot]) else {
        return false;
    };
    items.swap(pivot, successor);
    items[pivot + 1..].reverse();
    true
}

// =============================================================================
// Arbitrage Detector
// =============================================================================

/// Enumerates outcome assignments and flags the arbitrage ones.
#[derive(Debug, Clone, Default)]
pub struct ArbitrageDetector {
    cached_k: usize,
    cached: Vec<Vec<usize>>,
}

impl ArbitrageDetector {
    /// Creates a detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector with the permutations for `k` outcomes precomputed.
    #[must_use]
    pub fn for_outcomes(k: usize) -> Self {
        Self {
            cached_k: k,
            cached: permutations(k),
        }
    }

    fn orderings(&self, k: usize) -> std::borrow::Cow<'_, [Vec<usize>]> {
        if k == self.cached_k && !self.cached.is_empty() {
            std::borrow::Cow::Borrowed(&self.cached)
        } else {
            std::borrow::Cow::Owned(permutations(k))
        }
    }

    /// Evaluates all K! assignments of a candidate, in lexicographic order.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidOdds`] for non-positive odds and
    /// [`SurebetError::OutcomeCountMismatch`] if the odds matrix is not K x K.
    pub fn assignments(&self, candidate: &Candidate) -> Result<Vec<Assignment>> {
        let k = candidate.outcome_count();
        if let Some(row) = candidate.odds.iter().find(|row| row.len() != k) {
            return Err(SurebetError::OutcomeCountMismatch {
                expected: k,
                actual: row.len(),
            });
        }

        self.orderings(k)
            .iter()
            .map(|bookmakers| {
                let odds: Vec<Decimal> = bookmakers
                    .iter()
                    .enumerate()
                    .map(|(outcome, &bookmaker)| candidate.odds[outcome][bookmaker])
                    .collect();
                let implied_sum = implied_probability_sum(&odds).map_err(|_| {
                    let bad = odds
                        .iter()
                        .copied()
                        .find(|o| *o <= Decimal::ZERO)
                        .unwrap_or(Decimal::ZERO);
                    SurebetError::invalid_odds(
                        bad,
                        format!("{} / {}", candidate.combo, candidate.event.identity()),
                    )
                })?;

                Ok(Assignment {
                    bookmakers: bookmakers.clone(),
                    odds,
                    implied_sum,
                })
            })
            .collect()
    }

    /// Returns the assignments with Σ 1/odds < 1, in lexicographic order.
    ///
    /// # Errors
    ///
    /// See [`Self::assignments`].
    pub fn qualifying(&self, candidate: &Candidate) -> Result<Vec<Assignment>> {
        let assignments = self.assignments(candidate)?;
        let mut qualifying = Vec::new();

        for assignment in assignments {
            if assignment.is_arbitrage() {
                qualifying.push(assignment);
            } else {
                trace!(
                    event = %candidate.event.identity(),
                    bookmakers = ?assignment.bookmakers,
                    implied_sum = %assignment.implied_sum,
                    "No arbitrage"
                );
            }
        }

        Ok(qualifying)
    }
}
