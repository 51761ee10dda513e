//! Market taxonomy: which markets a sport offers, how many outcomes each has,
//! and how bookmakers label them.
//!
//! Both catalogues are JSON documents maintained next to the scrapers:
//!
//! ```text
//! sports_and_markets.json
//! { "Football": { "two-way": ["over/under 2.5"], "three-way": [],
//!                 "win-bet-is-three-way": true } }
//!
//! market_translations.json
//! { "Betfair": { "win": "Match Odds" } }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the match-result market appended when a sport's win bet is three-way.
pub const WIN_MARKET: &str = "win";

/// A market together with its number of mutually exclusive outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketSpec {
    /// Standard market name shared across bookmakers.
    pub name: String,
    /// Number of outcomes (K).
    pub outcome_count: usize,
}

impl MarketSpec {
    /// Creates a market with the given outcome count.
    #[must_use]
    pub fn new(name: impl Into<String>, outcome_count: usize) -> Self {
        Self {
            name: name.into(),
            outcome_count,
        }
    }

    /// Two-outcome market such as over/under.
    #[must_use]
    pub fn two_way(name: impl Into<String>) -> Self {
        Self::new(name, 2)
    }

    /// Three-outcome market such as 1X2 match result.
    #[must_use]
    pub fn three_way(name: impl Into<String>) -> Self {
        Self::new(name, 3)
    }
}

impl std::fmt::Display for MarketSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}-way)", self.name, self.outcome_count)
    }
}

// =============================================================================
// Sport Catalog
// =============================================================================

/// Markets offered for one sport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SportMarkets {
    #[serde(rename = "two-way", default)]
    pub two_way: Vec<String>,
    #[serde(rename = "three-way", default)]
    pub three_way: Vec<String>,
    #[serde(rename = "win-bet-is-three-way", default)]
    pub win_is_three_way: bool,
}

/// Catalogue of sports and their markets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SportCatalog {
    sports: BTreeMap<String, SportMarkets>,
}

impl SportCatalog {
    /// Parses a catalogue from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid catalogue document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid sports catalogue")
    }

    /// Loads a catalogue from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Returns the sport names in the catalogue.
    pub fn sports(&self) -> impl Iterator<Item = &str> {
        self.sports.keys().map(String::as_str)
    }

    /// Returns the markets of a sport, two-way first, with `win` appended as a
    /// three-way market when the sport's match result has a draw.
    ///
    /// Sport names are matched case-insensitively. Returns `None` for unknown sports.
    #[must_use]
    pub fn markets(&self, sport: &str) -> Option<Vec<MarketSpec>> {
        let entry = self
            .sports
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(sport))
            .map(|(_, markets)| markets)?;

        let mut markets: Vec<MarketSpec> = entry
            .two_way
            .iter()
            .map(|name| MarketSpec::two_way(name.clone()))
            .collect();
        markets.extend(
            entry
                .three_way
                .iter()
                .map(|name| MarketSpec::three_way(name.clone())),
        );
        if entry.win_is_three_way && !entry.three_way.iter().any(|m| m == WIN_MARKET) {
            markets.push(MarketSpec::three_way(WIN_MARKET));
        }
        Some(markets)
    }
}

// =============================================================================
// Market Translations
// =============================================================================

/// Per-bookmaker labels for the standard market names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketTranslations {
    /// bookmaker -> standard market -> site label
    by_bookmaker: BTreeMap<String, BTreeMap<String, String>>,
}

impl MarketTranslations {
    /// Parses translations from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid translation document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid market translations")
    }

    /// Loads translations from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Returns the bookmaker's label for a standard market, or the market itself.
    #[must_use]
    pub fn to_site_market<'a>(&'a self, market: &'a str, bookmaker: &str) -> &'a str {
        self.by_bookmaker
            .get(bookmaker)
            .and_then(|labels| labels.get(market))
            .map_or(market, String::as_str)
    }

    /// Returns the standard market name for a bookmaker label, or the label itself.
    ///
    /// When several standard markets share the label, the alphabetically first wins.
    #[must_use]
    pub fn to_standard_market<'a>(&'a self, label: &'a str, bookmaker: &str) -> &'a str {
        self.by_bookmaker
            .get(bookmaker)
            .and_then(|labels| {
                labels
                    .iter()
                    .find(|(_, site_label)| site_label.as_str() == label)
                    .map(|(standard, _)| standard.as_str())
            })
            .unwrap_or(label)
    }
}
