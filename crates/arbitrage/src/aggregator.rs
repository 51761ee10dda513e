//! Result aggregation.
//!
//! Each market keeps `combo key -> event identity -> plan`. Markets never
//! interact; a [`SurebetBook`] is the union of independent market reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use surebet_core::SelectionPolicy;

use crate::types::BetPlan;

/// Plans of one market keyed by combo key, then by event identity.
pub type ComboPlans = BTreeMap<String, BTreeMap<String, BetPlan>>;

// =============================================================================
// Market Report
// =============================================================================

/// Outcome of scanning one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MarketStatus {
    /// At least one plan survived.
    SurebetsFound,
    /// Nothing qualified, or every plan was discarded.
    NoSurebets,
    /// The scan was aborted by an error.
    Failed {
        /// Error message.
        reason: String,
    },
}

impl MarketStatus {
    /// Returns a short label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SurebetsFound => "surebets-found",
            Self::NoSurebets => "no-surebets",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

/// Plans and counters for one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketReport {
    /// Market name.
    pub market: String,
    /// Final status.
    #[serde(flatten)]
    pub status: MarketStatus,
    /// Surviving plans.
    pub combos: ComboPlans,
    /// Candidates evaluated.
    pub candidates: usize,
    /// Plans dropped because rounding made them unsafe.
    pub discarded: usize,
}

impl MarketReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(market: impl Into<String>) -> Self {
        Self {
            market: market.into(),
            status: MarketStatus::NoSurebets,
            combos: BTreeMap::new(),
            candidates: 0,
            discarded: 0,
        }
    }

    /// Creates a report for a market whose scan failed.
    #[must_use]
    pub fn failed(market: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: MarketStatus::Failed {
                reason: reason.into(),
            },
            ..Self::new(market)
        }
    }

    /// Stores a plan under its combo and event.
    ///
    /// With [`SelectionPolicy::LastQualifying`] a later plan always replaces
    /// an earlier one for the same event. With [`SelectionPolicy::BestProfit`]
    /// it replaces it only if its worst-case profit is strictly higher.
    /// Returns true if the plan was stored.
    pub fn record(&mut self, plan: BetPlan, policy: SelectionPolicy) -> bool {
        let events = self.combos.entry(plan.combo.to_string()).or_default();
        let identity = plan.event.identity().to_string();

        let replace = match (policy, events.get(&identity)) {
            (_, None) | (SelectionPolicy::LastQualifying, Some(_)) => true,
            (SelectionPolicy::BestProfit, Some(existing)) => {
                plan.min_profit() > existing.min_profit()
            }
        };

        if replace {
            events.insert(identity, plan);
        }
        replace
    }

    /// Counts a plan discarded as unsafe.
    pub fn record_discard(&mut self) {
        self.discarded += 1;
    }

    /// Settles the status from the collected plans.
    #[must_use]
    pub fn finish(mut self) -> Self {
        if !matches!(self.status, MarketStatus::Failed { .. }) {
            self.status = if self.plan_count() > 0 {
                MarketStatus::SurebetsFound
            } else {
                MarketStatus::NoSurebets
            };
        }
        self
    }

    /// Number of stored plans.
    #[must_use]
    pub fn plan_count(&self) -> usize {
        self.combos.values().map(BTreeMap::len).sum()
    }

    /// Iterates over stored plans by combo, then event.
    pub fn plans(&self) -> impl Iterator<Item = &BetPlan> {
        self.combos.values().flat_map(BTreeMap::values)
    }

    /// Looks up the plan for an event of a combo.
    #[must_use]
    pub fn plan(&self, combo: &str, event: &str) -> Option<&BetPlan> {
        self.combos.get(combo)?.get(event)
    }
}

// =============================================================================
// Surebet Book
// =============================================================================

/// Reports for every scanned market.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurebetBook {
    markets: BTreeMap<String, MarketReport>,
}

impl SurebetBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a market report.
    pub fn insert(&mut self, report: MarketReport) {
        self.markets.insert(report.market.clone(), report);
    }

    /// Merges another book; its reports replace same-named markets.
    pub fn merge(&mut self, other: SurebetBook) {
        self.markets.extend(other.markets);
    }

    /// Returns a market's report.
    #[must_use]
    pub fn get(&self, market: &str) -> Option<&MarketReport> {
        self.markets.get(market)
    }

    /// Iterates over reports in market order.
    pub fn reports(&self) -> impl Iterator<Item = &MarketReport> {
        self.markets.values()
    }

    /// Total number of plans across markets.
    #[must_use]
    pub fn plan_count(&self) -> usize {
        self.markets.values().map(MarketReport::plan_count).sum()
    }

    /// Returns true if any market has a plan.
    #[must_use]
    pub fn has_surebets(&self) -> bool {
        self.plan_count() > 0
    }

    /// Number of markets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    /// Returns true if no market was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

impl FromIterator<MarketReport> for SurebetBook {
    fn from_iter<I: IntoIterator<Item = MarketReport>>(iter: I) -> Self {
        let mut book = Self::new();
        for report in iter {
            book.insert(report);
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetLeg, ComboKey, EventMember, MatchedEventGroup};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn plan(event: &str, profits: &[Decimal]) -> BetPlan {
        BetPlan {
            market: "win".to_string(),
            combo: ComboKey::new(["Betfair", "bwin"]),
            event: MatchedEventGroup {
                members: vec![
                    EventMember {
                        bookmaker: "Betfair".to_string(),
                        label: event.to_string(),
                    },
                    EventMember {
                        bookmaker: "bwin".to_string(),
                        label: event.to_string(),
                    },
                ],
                scores: vec![100],
            },
            legs: profits
                .iter()
                .enumerate()
                .map(|(outcome, &profit)| BetLeg {
                    outcome,
                    bookmaker: "Betfair".to_string(),
                    competitors: event.to_string(),
                    odds: dec!(2.1),
                    stake: dec!(50),
                    profit,
                    benefit: format!("{profit:.2}%"),
                })
                .collect(),
            total_stake: dec!(100),
            implied_sum: dec!(0.95),
        }
    }

    // ==================== MarketStatus Tests ====================

    #[test]
    fn test_status_display() {
        assert_eq!(MarketStatus::SurebetsFound.to_string(), "surebets-found");
        assert_eq!(MarketStatus::NoSurebets.as_str(), "no-surebets");
        assert_eq!(
            MarketStatus::Failed {
                reason: "bad odds".to_string()
            }
            .to_string(),
            "failed: bad odds"
        );
    }

    // ==================== MarketReport Tests ====================

    #[test]
    fn test_record_last_qualifying_overwrites() {
        let mut report = MarketReport::new("win");

        assert!(report.record(plan("A v B", &[dec!(8), dec!(9)]), SelectionPolicy::LastQualifying));
        assert!(report.record(plan("A v B", &[dec!(1), dec!(2)]), SelectionPolicy::LastQualifying));

        assert_eq!(report.plan_count(), 1);
        assert_eq!(report.plan("Betfair-bwin", "A v B").unwrap().min_profit(), dec!(1));
    }

    #[test]
    fn test_record_best_profit_keeps_better() {
        let mut report = MarketReport::new("win");

        assert!(report.record(plan("A v B", &[dec!(5), dec!(9)]), SelectionPolicy::BestProfit));
        assert!(!report.record(plan("A v B", &[dec!(2), dec!(20)]), SelectionPolicy::BestProfit));
        assert!(!report.record(plan("A v B", &[dec!(5), dec!(6)]), SelectionPolicy::BestProfit));
        assert!(report.record(plan("A v B", &[dec!(7), dec!(7)]), SelectionPolicy::BestProfit));

        assert_eq!(report.plan("Betfair-bwin", "A v B").unwrap().min_profit(), dec!(7));
    }

    #[test]
    fn test_finish_sets_status() {
        let empty = MarketReport::new("win").finish();
        assert_eq!(empty.status, MarketStatus::NoSurebets);

        let mut report = MarketReport::new("win");
        report.record(plan("A v B", &[dec!(5), dec!(10)]), SelectionPolicy::default());
        report.record(plan("C v D", &[dec!(5), dec!(10)]), SelectionPolicy::default());
        let report = report.finish();

        assert_eq!(report.status, MarketStatus::SurebetsFound);
        assert_eq!(report.plan_count(), 2);
        assert_eq!(report.plans().count(), 2);
    }

    #[test]
    fn test_finish_keeps_failure() {
        let report = MarketReport::failed("win", "invalid odds 0").finish();
        assert_eq!(report.status.as_str(), "failed");
    }

    #[test]
    fn test_report_serializes_status_inline() {
        let mut report = MarketReport::new("win");
        report.record_discard();
        let json = serde_json::to_value(report.finish()).unwrap();

        assert_eq!(json["status"], "no_surebets");
        assert_eq!(json["discarded"], 1);
    }

    // ==================== SurebetBook Tests ====================

    #[test]
    fn test_book_union_of_markets() {
        let mut win = MarketReport::new("win");
        win.record(plan("A v B", &[dec!(5), dec!(10)]), SelectionPolicy::default());

        let mut book: SurebetBook = vec![win.finish(), MarketReport::new("btts").finish()]
            .into_iter()
            .collect();
        assert_eq!(book.len(), 2);
        assert_eq!(book.plan_count(), 1);
        assert!(book.has_surebets());

        let mut other = SurebetBook::new();
        other.insert(MarketReport::new("win").finish());
        book.merge(other);

        assert!(!book.has_surebets());
        assert_eq!(book.get("win").unwrap().status, MarketStatus::NoSurebets);
    }
}
