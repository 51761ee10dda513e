//! Fuzzy label similarity.
//!
//! Bookmakers name the same event differently ("Man Utd - Chelsea" vs
//! "Manchester United vs Chelsea FC"). Labels are compared as unordered token
//! sets and scored on a 0-100 scale.

use rapidfuzz::fuzz;
use std::collections::BTreeSet;

/// Scores how likely two labels denote the same event, from 0 to 100.
pub trait SimilarityScorer: Send + Sync {
    /// Returns the similarity of two labels.
    fn score(&self, left: &str, right: &str) -> u8;
}

impl<F> SimilarityScorer for F
where
    F: Fn(&str, &str) -> u8 + Send + Sync,
{
    fn score(&self, left: &str, right: &str) -> u8 {
        self(left, right)
    }
}

/// Token-set ratio: order-insensitive and tolerant of extra words.
///
/// Both labels are lowercased and split into word sets. The shared words
/// (`sect`) are compared against `sect` plus each side's leftovers, and the
/// best of the three indel ratios wins. A label whose words are all contained
/// in the other scores 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenSetRatio;

impl SimilarityScorer for TokenSetRatio {
    fn score(&self, left: &str, right: &str) -> u8 {
        token_set_ratio(left, right)
    }
}

/// Computes the token-set ratio of two labels.
#[must_use]
pub fn token_set_ratio(left: &str, right: &str) -> u8 {
    let left = tokens(left);
    let right = tokens(right);
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let sect = join(left.intersection(&right));
    let diff_ab = join(left.difference(&right));
    let diff_ba = join(right.difference(&left));

    let ab = concat(&sect, &diff_ab);
    let ba = concat(&sect, &diff_ba);

    ratio(&sect, &ab).max(ratio(&sect, &ba)).max(ratio(&ab, &ba))
}

/// Normalized indel similarity: `round(100 * 2 * LCS / (|x| + |y|))`.
///
/// Returns 0 if either side is empty.
#[must_use]
pub fn ratio(x: &str, y: &str) -> u8 {
    if x.is_empty() || y.is_empty() {
        return 0;
    }

    let score = fuzz::ratio(x.chars(), y.chars());
    // Halves round up; the epsilon absorbs float error on exact .5 scores.
    let rounded = (score + 1e-9).round().clamp(0.0, 100.0);
    rounded as u8
}

/// Lowercases, turns every run of non-alphanumerics into a separator and
/// collects the distinct words in sorted order.
fn tokens(label: &str) -> BTreeSet<String> {
    label
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn join<'a>(words: impl Iterator<Item = &'a String>) -> String {
    words.map(String::as_str).collect::<Vec<_>>().join(" ")
}

fn concat(sect: &str, diff: &str) -> String {
    format!("{sect} {diff}").trim().to_string()
}
