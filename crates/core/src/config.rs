use anyhow::{bail, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::taxonomy::MarketSpec;

/// Default similarity a label pair must exceed to be joined (0-100 scale).
pub const DEFAULT_MATCH_THRESHOLD: u8 = 60;

/// Which plan survives when several outcome assignments of one event qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// The last qualifying assignment in enumeration order replaces earlier ones.
    #[default]
    LastQualifying,
    /// The plan with the highest worst-case profit is kept; ties keep the earlier plan.
    BestProfit,
}

impl SelectionPolicy {
    /// Returns the display string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastQualifying => "last-qualifying",
            Self::BestProfit => "best-profit",
        }
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "last-qualifying" | "last" => Ok(Self::LastQualifying),
            "best-profit" | "best" => Ok(Self::BestProfit),
            _ => bail!("unknown selection policy '{s}', expected last-qualifying or best-profit"),
        }
    }
}

/// Settings for one surebet scan cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Money spread across all legs of one surebet.
    pub total_stake: Decimal,

    /// Granularity individual stakes are rounded to.
    pub rounding_base: Decimal,

    /// Similarity (0-100) a chained label match must exceed.
    pub match_threshold: u8,

    /// Overwrite policy for multiple qualifying assignments of one event.
    pub selection: SelectionPolicy,

    /// Seconds between two scans in watch mode.
    pub poll_interval_secs: u64,

    /// Sport whose catalogue supplies the markets when `markets` is empty.
    pub sport: Option<String>,

    /// Markets to scan, overriding the sport catalogue.
    pub markets: Vec<MarketSpec>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            total_stake: Decimal::from(100),
            rounding_base: Decimal::from(5),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            selection: SelectionPolicy::default(),
            poll_interval_secs: 60,
            sport: None,
            markets: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Fine-grained rounding, useful for exchanges that accept pennies.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            rounding_base: Decimal::ONE,
            ..Self::default()
        }
    }

    /// Sets the total stake.
    #[must_use]
    pub fn with_total_stake(mut self, total_stake: Decimal) -> Self {
        self.total_stake = total_stake;
        self
    }

    /// Sets the rounding base.
    #[must_use]
    pub fn with_rounding_base(mut self, rounding_base: Decimal) -> Self {
        self.rounding_base = rounding_base;
        self
    }

    /// Sets the match threshold.
    #[must_use]
    pub fn with_match_threshold(mut self, threshold: u8) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Sets the selection policy.
    #[must_use]
    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the explicit market list.
    #[must_use]
    pub fn with_markets(mut self, markets: Vec<MarketSpec>) -> Self {
        self.markets = markets;
        self
    }

    /// Checks that the configuration can drive a scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the stake, rounding base, threshold or any market
    /// outcome count is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.total_stake <= Decimal::ZERO {
            bail!("total_stake must be positive, got {}", self.total_stake);
        }
        if self.rounding_base <= Decimal::ZERO {
            bail!("rounding_base must be positive, got {}", self.rounding_base);
        }
        if self.match_threshold > 100 {
            bail!(
                "match_threshold must be within 0-100, got {}",
                self.match_threshold
            );
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        for market in &self.markets {
            if market.outcome_count < 2 {
                bail!(
                    "market '{}' needs at least 2 outcomes, got {}",
                    market.name,
                    market.outcome_count
                );
            }
        }
        Ok(())
    }
}
