//! Shared types for surebet detection.
//!
//! This module defines the data that flows through one scan: raw bookmaker
//! odds tables, their normalized rows, cross-bookmaker event groups,
//! candidates with their outcome assignments, and the final bet plans.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Raw Odds
// =============================================================================

/// One event row as published by a bookmaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsRow {
    /// Raw competitor/event label (e.g., "Arsenal v Tottenham").
    pub competitors: String,
    /// Raw odds cell per market; tokens are newline separated, one per outcome.
    #[serde(default)]
    pub markets: BTreeMap<String, String>,
}

impl OddsRow {
    /// Creates a row without any market cells.
    #[must_use]
    pub fn new(competitors: impl Into<String>) -> Self {
        Self {
            competitors: competitors.into(),
            markets: BTreeMap::new(),
        }
    }

    /// Adds a market cell.
    #[must_use]
    pub fn with_market(mut self, market: impl Into<String>, cell: impl Into<String>) -> Self {
        self.markets.insert(market.into(), cell.into());
        self
    }

    /// Returns the raw cell for a market, if the bookmaker published one.
    #[must_use]
    pub fn cell(&self, market: &str) -> Option<&str> {
        self.markets.get(market).map(String::as_str)
    }
}

/// A bookmaker's odds snapshot for one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsTable {
    /// Bookmaker identifier.
    pub bookmaker: String,
    /// Event rows.
    #[serde(default)]
    pub rows: Vec<OddsRow>,
}

impl OddsTable {
    /// Creates an empty table for a bookmaker.
    #[must_use]
    pub fn new(bookmaker: impl Into<String>) -> Self {
        Self {
            bookmaker: bookmaker.into(),
            rows: Vec::new(),
        }
    }

    /// Adds a row.
    #[must_use]
    pub fn with_row(mut self, row: OddsRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Parses a table from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid odds table.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Returns true if the bookmaker published nothing (or its scrape failed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renames every market column with `rename`, e.g. to map site labels
    /// back to standard market names.
    pub fn rename_markets<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        for row in &mut self.rows {
            row.markets = std::mem::take(&mut row.markets)
                .into_iter()
                .map(|(label, cell)| (rename(&label), cell))
                .collect();
        }
    }
}

/// All bookmakers' tables for one scan cycle, keyed by bookmaker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OddsSnapshot {
    tables: BTreeMap<String, OddsTable>,
}

impl OddsSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from tables; a later table for the same bookmaker replaces an earlier one.
    #[must_use]
    pub fn from_tables(tables: impl IntoIterator<Item = OddsTable>) -> Self {
        let mut snapshot = Self::new();
        for table in tables {
            snapshot.insert(table);
        }
        snapshot
    }

    /// Inserts or replaces a bookmaker's table.
    pub fn insert(&mut self, table: OddsTable) {
        self.tables.insert(table.bookmaker.clone(), table);
    }

    /// Returns a bookmaker's table.
    #[must_use]
    pub fn get(&self, bookmaker: &str) -> Option<&OddsTable> {
        self.tables.get(bookmaker)
    }

    /// Iterates over tables in bookmaker order.
    pub fn tables(&self) -> impl Iterator<Item = &OddsTable> {
        self.tables.values()
    }

    /// Mutable iteration over tables in bookmaker order.
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut OddsTable> {
        self.tables.values_mut()
    }

    /// Returns the bookmaker identifiers in sorted order.
    pub fn bookmakers(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of bookmakers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no bookmaker is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// =============================================================================
// Normalized Odds
// =============================================================================

/// A competitor label with one decimal price per outcome.
///
/// Every odds value is at least 1.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// Raw competitor/event label.
    pub label: String,
    /// Decimal odds in outcome order.
    pub odds: Vec<Decimal>,
}

impl NormalizedRow {
    /// Creates a normalized row.
    #[must_use]
    pub fn new(label: impl Into<String>, odds: Vec<Decimal>) -> Self {
        Self {
            label: label.into(),
            odds,
        }
    }
}

// =============================================================================
// Matched Events
// =============================================================================

/// One bookmaker's view of a matched event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMember {
    /// Bookmaker identifier.
    pub bookmaker: String,
    /// The bookmaker's label for the event.
    pub label: String,
}

/// Labels from several bookmakers believed to denote the same event.
///
/// `scores[i]` is the similarity between `members[i]` and `members[i + 1]`,
/// following the order in which the match chain was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedEventGroup {
    /// Members in chain order; the first one is the reference bookmaker.
    pub members: Vec<EventMember>,
    /// Similarity scores along the chain (0-100).
    pub scores: Vec<u8>,
}

impl MatchedEventGroup {
    /// Returns the event identity used to key results: the reference bookmaker's label.
    #[must_use]
    pub fn identity(&self) -> &str {
        self.members.first().map_or("", |m| m.label.as_str())
    }

    /// Returns the lowest score along the chain.
    #[must_use]
    pub fn min_score(&self) -> Option<u8> {
        self.scores.iter().copied().min()
    }

    /// Returns true if every chained score exceeds the threshold.
    #[must_use]
    pub fn exceeds_threshold(&self, threshold: u8) -> bool {
        self.scores.iter().all(|&score| score > threshold)
    }
}

/// Unordered set of bookmakers, kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComboKey(Vec<String>);

impl ComboKey {
    /// Creates a key, sorting the identifiers.
    #[must_use]
    pub fn new<I, S>(bookmakers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bookmakers: Vec<String> = bookmakers.into_iter().map(Into::into).collect();
        bookmakers.sort();
        Self(bookmakers)
    }

    /// Returns the bookmakers in sorted order.
    #[must_use]
    pub fn bookmakers(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of bookmakers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key holds no bookmakers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ComboKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("-"))
    }
}

// =============================================================================
// Candidates and Assignments
// =============================================================================

/// One event priced by all K bookmakers of a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// The bookmakers, in the same order as `event.members`.
    pub combo: ComboKey,
    /// The matched event.
    pub event: MatchedEventGroup,
    /// `odds[outcome][bookmaker]`, K x K.
    pub odds: Vec<Vec<Decimal>>,
}

impl Candidate {
    /// Builds a candidate from the matched rows, one per bookmaker in combo order.
    #[must_use]
    pub fn from_rows(combo: ComboKey, event: MatchedEventGroup, rows: &[&NormalizedRow]) -> Self {
        let outcome_count = rows.first().map_or(0, |r| r.odds.len());
        let odds = (0..outcome_count)
            .map(|outcome| rows.iter().map(|row| row.odds[outcome]).collect())
            .collect();

        Self { combo, event, odds }
    }

    /// Number of outcomes (and bookmakers).
    #[must_use]
    pub fn outcome_count(&self) -> usize {
        self.odds.len()
    }

    /// Returns the price bookmaker `bookmaker` offers for `outcome`.
    #[must_use]
    pub fn price(&self, outcome: usize, bookmaker: usize) -> Option<Decimal> {
        self.odds.get(outcome)?.get(bookmaker).copied()
    }
}

/// A bijection from outcomes to bookmakers within a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// `bookmakers[outcome]` is the index of the bookmaker backing that outcome.
    pub bookmakers: Vec<usize>,
    /// The odds used, in outcome order.
    pub odds: Vec<Decimal>,
    /// Sum of implied probabilities (Σ 1/odds).
    pub implied_sum: Decimal,
}

impl Assignment {
    /// Returns true if the assignment guarantees a profit (Σ 1/odds < 1).
    #[must_use]
    pub fn is_arbitrage(&self) -> bool {
        self.implied_sum < Decimal::ONE
    }

    /// Theoretical margin (1 - Σ 1/odds); positive for arbitrage.
    #[must_use]
    pub fn margin(&self) -> Decimal {
        Decimal::ONE - self.implied_sum
    }
}

// =============================================================================
// Bet Plans
// =============================================================================

/// One leg of a bet plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLeg {
    /// Outcome index within the market.
    pub outcome: usize,
    /// Bookmaker to place this leg with.
    pub bookmaker: String,
    /// The bookmaker's label for the event.
    pub competitors: String,
    /// Decimal odds taken.
    pub odds: Decimal,
    /// Rounded stake.
    pub stake: Decimal,
    /// Profit if this outcome wins (payout minus total stake).
    pub profit: Decimal,
    /// Profit as a percentage of total stake, e.g. "5.00%".
    pub benefit: String,
}

/// A finalized stake plan for one surebet.
///
/// Stakes sum to at most `total_stake` and every leg's profit is positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetPlan {
    /// Market name.
    pub market: String,
    /// Bookmaker combination.
    pub combo: ComboKey,
    /// The matched event.
    pub event: MatchedEventGroup,
    /// One leg per outcome.
    pub legs: Vec<BetLeg>,
    /// Configured total stake.
    pub total_stake: Decimal,
    /// Σ 1/odds of the assignment behind this plan.
    pub implied_sum: Decimal,
}

impl BetPlan {
    /// Sum of the rounded stakes.
    #[must_use]
    pub fn staked(&self) -> Decimal {
        self.legs.iter().map(|leg| leg.stake).sum()
    }

    /// Worst-case profit across outcomes.
    #[must_use]
    pub fn min_profit(&self) -> Decimal {
        self.legs
            .iter()
            .map(|leg| leg.profit)
            .min()
            .unwrap_or(Decimal::ZERO)
    }

    /// Returns true if every outcome yields a strictly positive profit.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        !self.legs.is_empty() && self.legs.iter().all(|leg| leg.profit > Decimal::ZERO)
    }
}
