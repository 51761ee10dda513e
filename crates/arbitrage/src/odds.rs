//! Odds normalization.
//!
//! Bookmakers publish one cell per event and market holding newline separated
//! odds tokens. Tokens may be decimal (`2.10`), fractional (`11/10`) or a
//! sentinel (`SUSPENDED`, `CLOSED`, `EVS`, empty) that carries no edge and is
//! priced at break-even (1.0).

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, trace};

use crate::error::{Result, SurebetError};
use crate::types::{NormalizedRow, OddsTable};

/// Whole-cell markers for a market that is not currently tradable.
const CELL_SENTINELS: [&str; 2] = ["SUSPENDED", "CLOSED"];

/// Token markers priced at break-even.
const TOKEN_SENTINELS: [&str; 3] = ["SUSPENDED", "CLOSED", "EVS"];

fn decimal_comma() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d,\d").expect("literal pattern is valid"))
}

/// Converts raw odds cells into fixed-length decimal odds vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OddsNormalizer {
    outcome_count: usize,
}

impl OddsNormalizer {
    /// Creates a normalizer for a market with `outcome_count` outcomes.
    #[must_use]
    pub fn new(outcome_count: usize) -> Self {
        Self { outcome_count }
    }

    /// Number of odds each normalized row carries.
    #[must_use]
    pub fn outcome_count(&self) -> usize {
        self.outcome_count
    }

    /// Normalizes every row of a table for one market.
    ///
    /// Rows without exactly K parseable tokens are dropped. A row missing the
    /// market cell is treated like an empty cell.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidOdds`] if any parsed value is below 1.0.
    pub fn normalize_table(&self, table: &OddsTable, market: &str) -> Result<Vec<NormalizedRow>> {
        let mut rows = Vec::with_capacity(table.rows.len());

        for row in &table.rows {
            let cell = row.cell(market).unwrap_or("");
            match self.normalize_cell(cell) {
                Some(odds) => {
                    if let Some(bad) = odds.iter().find(|&&o| o < Decimal::ONE) {
                        return Err(SurebetError::invalid_odds(
                            *bad,
                            format!("{} / {} / {}", table.bookmaker, row.competitors, market),
                        ));
                    }
                    rows.push(NormalizedRow::new(row.competitors.clone(), odds));
                }
                None => {
                    debug!(
                        bookmaker = %table.bookmaker,
                        competitors = %row.competitors,
                        market = %market,
                        "Dropping row without {} parseable odds",
                        self.outcome_count
                    );
                }
            }
        }

        trace!(
            bookmaker = %table.bookmaker,
            market = %market,
            kept = rows.len(),
            total = table.rows.len(),
            "Normalized odds table"
        );

        Ok(rows)
    }

    /// Converts one raw cell into K odds, or `None` if the row must be dropped.
    ///
    /// Values are returned unvalidated; see [`Self::normalize_table`].
    #[must_use]
    pub fn normalize_cell(&self, cell: &str) -> Option<Vec<Decimal>> {
        if is_suspended_cell(cell) {
            return Some(vec![Decimal::ONE; self.outcome_count]);
        }

        let tokens: Vec<&str> = cell.split('\n').collect();
        if tokens.len() < self.outcome_count {
            return None;
        }

        // Extra leading lines are descriptive text such as a goal line.
        tokens[tokens.len() - self.outcome_count..]
            .iter()
            .map(|token| parse_token(token))
            .collect()
    }
}

/// Returns true if the whole cell marks the market as unavailable.
fn is_suspended_cell(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty()
        || CELL_SENTINELS
            .iter()
            .any(|sentinel| cell.eq_ignore_ascii_case(sentinel))
}

/// Parses one odds token into decimal odds.
///
/// Fractional odds `a/b` become `a/b + 1`. Sentinels become 1.0. Returns `None`
/// for anything that does not parse, including a zero denominator.
#[must_use]
pub fn parse_token(token: &str) -> Option<Decimal> {
    let token = token.trim();
    if token.is_empty()
        || TOKEN_SENTINELS
            .iter()
            .any(|sentinel| token.eq_ignore_ascii_case(sentinel))
    {
        return Some(Decimal::ONE);
    }

    if let Some((numerator, denominator)) = token.split_once('/') {
        let numerator = Decimal::from_str(numerator.trim()).ok()?;
        let denominator = Decimal::from_str(denominator.trim()).ok()?;
        return numerator
            .checked_div(denominator)
            .and_then(|ratio| ratio.checked_add(Decimal::ONE));
    }

    let token = decimal_comma().replace_all(token, "1");
    Decimal::from_str(&token).ok()
}
