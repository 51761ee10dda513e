//! Market scanning.
//!
//! Runs the whole pipeline for one market at a time: normalize every
//! bookmaker's table, build candidates, test every outcome assignment and
//! allocate stakes for the arbitrage ones.

use tracing::{debug, info, warn};

use surebet_core::{MarketSpec, ScanConfig};

use crate::aggregator::{MarketReport, SurebetBook};
use crate::candidates::{CandidateBuilder, NormalizedTables};
use crate::detector::ArbitrageDetector;
use crate::error::{Result, SurebetError};
use crate::matcher::EntityMatcher;
use crate::odds::OddsNormalizer;
use crate::similarity::{SimilarityScorer, TokenSetRatio};
use crate::stakes::{Allocation, StakeAllocator, StakeLeg};
use crate::types::{Assignment, BetLeg, BetPlan, Candidate, OddsSnapshot};

/// Scans odds snapshots for surebets.
#[derive(Debug, Clone)]
pub struct SurebetScanner<S = TokenSetRatio> {
    config: ScanConfig,
    allocator: StakeAllocator,
    builder: CandidateBuilder<S>,
}

impl SurebetScanner<TokenSetRatio> {
    /// Creates a scanner using token-set ratio matching.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: ScanConfig) -> Result<Self> {
        Self::with_scorer(config, TokenSetRatio)
    }
}

impl<S: SimilarityScorer> SurebetScanner<S> {
    /// Creates a scanner with a custom label scorer.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidConfig`] if the configuration is invalid.
    pub fn with_scorer(config: ScanConfig, scorer: S) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SurebetError::invalid_config(e.to_string()))?;

        let allocator = StakeAllocator::new(config.total_stake, config.rounding_base)?;
        let builder = CandidateBuilder::with_matcher(EntityMatcher::with_scorer(scorer))
            .with_threshold(config.match_threshold);

        Ok(Self {
            config,
            allocator,
            builder,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Normalizes every bookmaker's table for a market.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidOdds`] if a table holds odds below 1.0.
    pub fn normalize(&self, market: &MarketSpec, snapshot: &OddsSnapshot) -> Result<NormalizedTables> {
        let normalizer = OddsNormalizer::new(market.outcome_count);

        snapshot
            .tables()
            .map(|table| {
                normalizer
                    .normalize_table(table, &market.name)
                    .map(|rows| (table.bookmaker.clone(), rows))
            })
            .collect()
    }

    /// Scans one market.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidConfig`] for a market with fewer than two
    /// outcomes and [`SurebetError::InvalidOdds`] for degenerate odds.
    pub fn scan_market(&self, market: &MarketSpec, snapshot: &OddsSnapshot) -> Result<MarketReport> {
        if market.outcome_count < 2 {
            return Err(SurebetError::invalid_config(format!(
                "market {} needs at least 2 outcomes, has {}",
                market.name, market.outcome_count
            )));
        }

        let tables = self.normalize(market, snapshot)?;
        let candidates = self.builder.build(&tables, market.outcome_count);
        let detector = ArbitrageDetector::for_outcomes(market.outcome_count);
        let mut report = MarketReport::new(market.name.clone());
        report.candidates = candidates.len();

        debug!(
            market = %market,
            bookmakers = tables.len(),
            candidates = candidates.len(),
            "Evaluating candidates"
        );

        for candidate in &candidates {
            for assignment in detector.qualifying(candidate)? {
                let allocation = self.allocator.allocate(&assignment.odds)?;
                if allocation.legs().len() != market.outcome_count {
                    return Err(SurebetError::OutcomeCountMismatch {
                        expected: market.outcome_count,
                        actual: allocation.legs().len(),
                    });
                }
                match allocation {
                    Allocation::Safe(legs) => {
                        let plan = self.build_plan(&market.name, candidate, &assignment, legs);
                        info!(
                            market = %market.name,
                            combo = %plan.combo,
                            event = %plan.event.identity(),
                            implied_sum = %plan.implied_sum,
                            min_profit = %plan.min_profit(),
                            "Surebet found"
                        );
                        report.record(plan, self.config.selection);
                    }
                    Allocation::Unsafe { reason, .. } => {
                        info!(
                            market = %market.name,
                            combo = %candidate.combo,
                            event = %candidate.event.identity(),
                            reason = %reason,
                            "Found unsafe bet, discarding"
                        );
                        report.record_discard();
                    }
                }
            }
        }

        let report = report.finish();
        if report.plan_count() == 0 {
            info!(
                market = %market.name,
                discarded = report.discarded,
                "No surebets found for {}!",
                market.name
            );
        }

        Ok(report)
    }

    /// Scans every market; a market that fails is reported as failed and the
    /// others still run.
    #[must_use]
    pub fn scan(&self, markets: &[MarketSpec], snapshot: &OddsSnapshot) -> SurebetBook {
        markets
            .iter()
            .map(|market| self.scan_market_or_fail(market, snapshot))
            .collect()
    }

    /// Scans one market, folding an error into a failed report.
    #[must_use]
    pub fn scan_market_or_fail(&self, market: &MarketSpec, snapshot: &OddsSnapshot) -> MarketReport {
        self.scan_market(market, snapshot).unwrap_or_else(|e| {
            warn!(market = %market.name, error = %e, "Market scan failed");
            MarketReport::failed(market.name.clone(), e.to_string())
        })
    }

    fn build_plan(
        &self,
        market: &str,
        candidate: &Candidate,
        assignment: &Assignment,
        legs: Vec<StakeLeg>,
    ) -> BetPlan {
        let legs = legs
            .into_iter()
            .map(|leg| {
                let member = &candidate.event.members[assignment.bookmakers[leg.outcome]];
                BetLeg {
                    outcome: leg.outcome,
                    bookmaker: member.bookmaker.clone(),
                    competitors: member.label.clone(),
                    odds: leg.odds,
                    stake: leg.stake,
                    profit: leg.profit,
                    benefit: leg.benefit,
                }
            })
            .collect();

        BetPlan {
            market: market.to_string(),
            combo: candidate.combo.clone(),
            event: candidate.event.clone(),
            legs,
            total_stake: self.allocator.total_stake(),
            implied_sum: assignment.implied_sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::MarketStatus;
    use crate::types::{OddsRow, OddsTable};
    use rust_decimal_macros::dec;
    use surebet_core::SelectionPolicy;

    fn snapshot() -> OddsSnapshot {
        OddsSnapshot::from_tables(vec![
            OddsTable::new("Betfair")
                .with_row(OddsRow::new("Man Utd - Chelsea").with_market("btts", "2.1\n1.7"))
                .with_row(OddsRow::new("Liverpool - Everton").with_market("btts", "1.8\n1.8")),
            OddsTable::new("bwin")
                .with_row(
                    OddsRow::new("Manchester United vs Chelsea FC").with_market("btts", "1.8\n2.2"),
                )
                .with_row(OddsRow::new("Liverpool vs Everton").with_market("btts", "1.8\n1.8")),
        ])
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ScanConfig::default().with_rounding_base(dec!(0));
        let err = SurebetScanner::new(config).unwrap_err();

        assert!(matches!(err, SurebetError::InvalidConfig(_)));
    }

    // ==================== Scan Tests ====================

    #[test]
    fn test_scan_market_finds_two_way_surebet() {
        let scanner = SurebetScanner::new(ScanConfig::default()).unwrap();
        let report = scanner
            .scan_market(&MarketSpec::two_way("btts"), &snapshot())
            .unwrap();

        assert_eq!(report.status, MarketStatus::SurebetsFound);
        assert_eq!(report.plan_count(), 1);
        assert_eq!(report.candidates, 2);

        let plan = report.plan("Betfair-bwin", "Man Utd - Chelsea").unwrap();
        assert_eq!(plan.legs[0].bookmaker, "Betfair");
        assert_eq!(plan.legs[0].odds, dec!(2.1));
        assert_eq!(plan.legs[1].bookmaker, "bwin");
        assert_eq!(plan.legs[1].competitors, "Manchester United vs Chelsea FC");
        assert_eq!(plan.legs[1].odds, dec!(2.2));
        assert_eq!(plan.legs[0].benefit, "5.00%");
        assert!(plan.is_safe());
    }

    #[test]
    fn test_scan_market_no_surebets() {
        let scanner = SurebetScanner::new(ScanConfig::default()).unwrap();
        let snapshot = OddsSnapshot::from_tables(vec![
            OddsTable::new("Betfair")
                .with_row(OddsRow::new("Liverpool - Everton").with_market("btts", "1.8\n1.8")),
            OddsTable::new("bwin")
                .with_row(OddsRow::new("Liverpool vs Everton").with_market("btts", "1.8\n1.8")),
        ]);

        let report = scanner
            .scan_market(&MarketSpec::two_way("btts"), &snapshot)
            .unwrap();

        assert_eq!(report.status, MarketStatus::NoSurebets);
        assert_eq!(report.discarded, 0);
    }

    #[test]
    fn test_scan_market_counts_unsafe_discards() {
        let config = ScanConfig::default().with_rounding_base(dec!(30));
        let scanner = SurebetScanner::new(config).unwrap();
        let snapshot = OddsSnapshot::from_tables(vec![
            OddsTable::new("Betfair")
                .with_row(OddsRow::new("Arsenal v Tottenham").with_market("btts", "2.5\n1.1")),
            OddsTable::new("bwin")
                .with_row(OddsRow::new("Arsenal vs Tottenham").with_market("btts", "1.1\n2.5")),
        ]);

        let report = scanner
            .scan_market(&MarketSpec::two_way("btts"), &snapshot)
            .unwrap();

        assert_eq!(report.status, MarketStatus::NoSurebets);
        assert_eq!(report.discarded, 1);
    }

    #[test]
    fn test_scan_market_rejects_single_outcome() {
        let scanner = SurebetScanner::new(ScanConfig::default()).unwrap();
        let result = scanner.scan_market(&MarketSpec::new("outright", 1), &snapshot());

        assert!(matches!(result, Err(SurebetError::InvalidConfig(_))));
    }

    #[test]
    fn test_scan_isolates_failed_market() {
        let scanner = SurebetScanner::new(ScanConfig::default()).unwrap();
        let mut snapshot = snapshot();
        snapshot.insert(
            OddsTable::new("Ladbrokes")
                .with_row(OddsRow::new("Man Utd v Chelsea").with_market("win", "0\n3.4\n3.2")),
        );

        let book = scanner.scan(
            &[MarketSpec::two_way("btts"), MarketSpec::three_way("win")],
            &snapshot,
        );

        assert_eq!(book.get("btts").unwrap().status, MarketStatus::SurebetsFound);
        assert_eq!(book.get("win").unwrap().status.as_str(), "failed");
    }

    fn extreme_snapshot(cell: &str) -> OddsSnapshot {
        OddsSnapshot::from_tables(vec![
            OddsTable::new("Betfair")
                .with_row(OddsRow::new("Nadal v Federer").with_market("sets", cell)),
            OddsTable::new("bwin").with_row(OddsRow::new("Nadal - Federer").with_market("sets", cell)),
        ])
    }

    #[test]
    fn test_scan_market_payout_overflow_is_invalid_odds() {
        let scanner = SurebetScanner::new(ScanConfig::default()).unwrap();
        let snapshot =
            extreme_snapshot("2000000000000000000000000000\n2000000000000000000000000000");

        let result = scanner.scan_market(&MarketSpec::two_way("sets"), &snapshot);
        assert!(matches!(result, Err(SurebetError::InvalidOdds { .. })));

        let report = scanner.scan_market_or_fail(&MarketSpec::two_way("sets"), &snapshot);
        assert_eq!(report.status.as_str(), "failed");
        assert_eq!(report.plan_count(), 0);
    }

    #[test]
    fn test_scan_market_vanishing_probabilities_record_no_plan() {
        let scanner = SurebetScanner::new(ScanConfig::default()).unwrap();
        let snapshot =
            extreme_snapshot("79228162514264337593543950335\n79228162514264337593543950335");

        let result = scanner.scan_market(&MarketSpec::two_way("sets"), &snapshot);
        assert!(matches!(result, Err(SurebetError::InvalidOdds { .. })));

        let book = scanner.scan(&[MarketSpec::two_way("sets")], &snapshot);
        let report = book.get("sets").unwrap();
        assert_ne!(report.status, MarketStatus::SurebetsFound);
        assert!(report.plans().all(|plan| plan.legs.len() == 2));
    }

    #[test]
    fn test_best_profit_policy_keeps_one_plan_per_event() {
        let config = ScanConfig::default()
            .with_rounding_base(dec!(1))
            .with_selection(SelectionPolicy::BestProfit);
        let scanner = SurebetScanner::new(config).unwrap();
        // Both assignments qualify: (3.0, 3.0) and (2.5, 2.5).
        let snapshot = OddsSnapshot::from_tables(vec![
            OddsTable::new("Betfair")
                .with_row(OddsRow::new("Arsenal v Tottenham").with_market("btts", "3.0\n2.5")),
            OddsTable::new("bwin")
                .with_row(OddsRow::new("Arsenal vs Tottenham").with_market("btts", "2.5\n3.0")),
        ]);

        let report = scanner
            .scan_market(&MarketSpec::two_way("btts"), &snapshot)
            .unwrap();

        assert_eq!(report.plan_count(), 1);
        let plan = report.plan("Betfair-bwin", "Arsenal v Tottenham").unwrap();
        assert_eq!(plan.legs[0].odds, dec!(3.0));
        assert_eq!(plan.legs[1].odds, dec!(3.0));
    }

    #[test]
    fn test_custom_scorer() {
        let scanner =
            SurebetScanner::with_scorer(ScanConfig::default(), |_: &str, _: &str| -> u8 { 0 })
                .unwrap();
        let report = scanner
            .scan_market(&MarketSpec::two_way("btts"), &snapshot())
            .unwrap();

        assert_eq!(report.candidates, 0);
        assert_eq!(report.status, MarketStatus::NoSurebets);
    }
}
