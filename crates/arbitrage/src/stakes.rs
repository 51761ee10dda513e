//! Stake allocation.
//!
//! The equal-payout split `stake_i = total * (1/odds_i) / S` makes every
//! outcome return the same amount. Bookmakers want round stakes, so each
//! stake is rounded to a multiple of the rounding base; if that overshoots
//! the budget only the last stake is cut back. Profits are then recomputed
//! from the rounded stakes and the plan is rejected unless every outcome
//! still wins money.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detector::implied_probability_sum;
use crate::error::{Result, SurebetError};

/// Stake and outcome for one leg, before it is tied to a bookmaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeLeg {
    /// Outcome index.
    pub outcome: usize,
    /// Decimal odds.
    pub odds: Decimal,
    /// Rounded stake.
    pub stake: Decimal,
    /// Payout minus total stake if this outcome wins.
    pub profit: Decimal,
    /// Profit as a percentage of total stake, two decimals with a `%` suffix.
    pub benefit: String,
}

/// Result of allocating stakes over one set of odds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    /// Every outcome yields a positive profit.
    Safe(Vec<StakeLeg>),
    /// Rounding left at least one outcome without profit.
    Unsafe {
        /// The legs as rounded.
        legs: Vec<StakeLeg>,
        /// Human readable diagnostic.
        reason: String,
    },
}

impl Allocation {
    /// Returns true if the plan can be used.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe(_))
    }

    /// Returns the legs regardless of safety.
    #[must_use]
    pub fn legs(&self) -> &[StakeLeg] {
        match self {
            Self::Safe(legs) | Self::Unsafe { legs, .. } => legs,
        }
    }
}

/// Splits a total stake across outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeAllocator {
    total_stake: Decimal,
    rounding_base: Decimal,
}

impl StakeAllocator {
    /// Creates an allocator.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidConfig`] unless both values are positive.
    pub fn new(total_stake: Decimal, rounding_base: Decimal) -> Result<Self> {
        if total_stake <= Decimal::ZERO {
            return Err(SurebetError::invalid_config(format!(
                "total_stake must be positive, got {total_stake}"
            )));
        }
        if rounding_base <= Decimal::ZERO {
            return Err(SurebetError::invalid_config(format!(
                "rounding_base must be positive, got {rounding_base}"
            )));
        }
        Ok(Self {
            total_stake,
            rounding_base,
        })
    }

    /// Total stake to split.
    #[must_use]
    pub fn total_stake(&self) -> Decimal {
        self.total_stake
    }

    /// Granularity of each stake.
    #[must_use]
    pub fn rounding_base(&self) -> Decimal {
        self.rounding_base
    }

    /// Equal-payout stakes before rounding; they sum to the total stake.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidOdds`] for non-positive odds, for odds so
    /// large that their implied probabilities vanish, or when an intermediate
    /// value overflows.
    pub fn unrounded(&self, odds: &[Decimal]) -> Result<Vec<Decimal>> {
        let sum = self.nonzero_sum(odds)?;

        odds.iter()
            .map(|&o| {
                Decimal::ONE
                    .checked_div(o)
                    .and_then(|p| self.total_stake.checked_mul(p))
                    .and_then(|weighted| weighted.checked_div(sum))
                    .ok_or_else(|| SurebetError::invalid_odds(o, "stake overflow"))
            })
            .collect()
    }

    /// Guaranteed profit of the unrounded split, `total * (1/S - 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidOdds`] for non-positive or vanishing
    /// odds, or when the profit overflows.
    pub fn guaranteed_profit(&self, odds: &[Decimal]) -> Result<Decimal> {
        let sum = self.nonzero_sum(odds)?;
        Decimal::ONE
            .checked_div(sum)
            .and_then(|inverse| inverse.checked_sub(Decimal::ONE))
            .and_then(|margin| self.total_stake.checked_mul(margin))
            .ok_or_else(|| SurebetError::invalid_odds(sum, "guaranteed profit overflow"))
    }

    /// Rounds a stake to the nearest multiple of the rounding base, ties up.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidConfig`] if the value is too large for
    /// the rounding base.
    pub fn round_to_base(&self, value: Decimal) -> Result<Decimal> {
        value
            .checked_div(self.rounding_base)
            .map(|units| units.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|units| units.checked_mul(self.rounding_base))
            .ok_or_else(|| {
                SurebetError::invalid_config(format!(
                    "stake {value} cannot be rounded to base {}",
                    self.rounding_base
                ))
            })
    }

    /// Computes rounded stakes, repairs an overshoot and checks profitability.
    ///
    /// # Errors
    ///
    /// Returns [`SurebetError::InvalidOdds`] for non-positive or vanishing odds
    /// and when a payout overflows.
    pub fn allocate(&self, odds: &[Decimal]) -> Result<Allocation> {
        let mut stakes = self
            .unrounded(odds)?
            .into_iter()
            .map(|stake| self.round_to_base(stake))
            .collect::<Result<Vec<_>>>()?;

        let staked = stakes
            .iter()
            .try_fold(Decimal::ZERO, |acc, &stake| acc.checked_add(stake))
            .ok_or_else(|| SurebetError::invalid_config("rounded stakes overflow"))?;
        if staked > self.total_stake {
            if let Some((last, others)) = stakes.split_last_mut() {
                let others: Decimal = others.iter().copied().sum();
                debug!(
                    staked = %staked,
                    total_stake = %self.total_stake,
                    last_before = %*last,
                    last_after = %(self.total_stake - others),
                    "Rounded stakes exceed total, reducing last stake"
                );
                *last = self.total_stake - others;
            }
        }

        let legs = odds
            .iter()
            .zip(&stakes)
            .enumerate()
            .map(|(outcome, (&odds, &stake))| {
                let profit = stake
                    .checked_mul(odds)
                    .and_then(|payout| payout.checked_sub(self.total_stake))
                    .ok_or_else(|| SurebetError::invalid_odds(odds, "payout overflow"))?;
                Ok(StakeLeg {
                    outcome,
                    odds,
                    stake,
                    profit,
                    benefit: self.benefit(profit)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(losing) = legs.iter().find(|leg| leg.profit <= Decimal::ZERO) {
            let reason = format!(
                "outcome {} at odds {} with stake {} yields profit {}",
                losing.outcome, losing.odds, losing.stake, losing.profit
            );
            return Ok(Allocation::Unsafe { legs, reason });
        }

        Ok(Allocation::Safe(legs))
    }

    /// Implied probability sum that can be divided by.
    fn nonzero_sum(&self, odds: &[Decimal]) -> Result<Decimal> {
        let sum = implied_probability_sum(odds)?;
        if sum.is_zero() {
            let largest = odds.iter().copied().max().unwrap_or_default();
            return Err(SurebetError::invalid_odds(
                largest,
                "implied probabilities vanish",
            ));
        }
        Ok(sum)
    }

    fn benefit(&self, profit: Decimal) -> Result<String> {
        let percent = profit
            .checked_div(self.total_stake)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| SurebetError::invalid_odds(profit, "benefit overflow"))?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Ok(format!("{percent:.2}%"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn allocator(total: Decimal, base: Decimal) -> StakeAllocator {
        StakeAllocator::new(total, base).unwrap()
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_rejects_non_positive() {
        assert!(StakeAllocator::new(dec!(0), dec!(5)).is_err());
        assert!(StakeAllocator::new(dec!(100), dec!(0)).is_err());
        assert!(StakeAllocator::new(dec!(-10), dec!(5)).is_err());
    }

    // ==================== Unrounded Tests ====================

    #[test]
    fn test_unrounded_two_way() {
        let stakes = allocator(dec!(100), dec!(1))
            .unrounded(&[dec!(2.1), dec!(2.2)])
            .unwrap();

        assert_eq!(stakes[0].round_dp(2), dec!(51.16));
        assert_eq!(stakes[1].round_dp(2), dec!(48.84));
    }

    #[test]
    fn test_guaranteed_profit_two_way() {
        let profit = allocator(dec!(100), dec!(1))
            .guaranteed_profit(&[dec!(2.1), dec!(2.2)])
            .unwrap();

        assert_eq!(profit.round_dp(2), dec!(7.44));
    }

    #[test]
    fn test_unrounded_equal_payout_sweep() {
        let tolerance = dec!(0.000001);
        let grids: [&[Decimal]; 4] = [
            &[dec!(2.1), dec!(2.2)],
            &[dec!(1.5), dec!(3.5)],
            &[dec!(3.2), dec!(3.8), dec!(3.1)],
            &[dec!(2.5), dec!(4.5), dec!(6.0)],
        ];

        for odds in grids {
            for total in [dec!(10), dec!(100), dec!(2500)] {
                let stakes = allocator(total, dec!(1)).unrounded(odds).unwrap();
                let sum: Decimal = stakes.iter().copied().sum();
                assert!((sum - total).abs() < tolerance, "sum {sum} != {total}");

                let payout = stakes[0] * odds[0];
                for (stake, o) in stakes.iter().zip(odds) {
                    assert!((*stake * *o - payout).abs() < tolerance);
                }
            }
        }
    }

    // ==================== Rounding Tests ====================

    #[test]
    fn test_round_to_base() {
        let allocator = allocator(dec!(100), dec!(5));

        assert_eq!(allocator.round_to_base(dec!(51.16)).unwrap(), dec!(50));
        assert_eq!(allocator.round_to_base(dec!(48.84)).unwrap(), dec!(50));
        assert_eq!(allocator.round_to_base(dec!(52.5)).unwrap(), dec!(55));
        assert_eq!(allocator.round_to_base(dec!(2.4)).unwrap(), dec!(0));
    }

    #[test]
    fn test_round_to_fractional_base() {
        let allocator = allocator(dec!(100), dec!(0.5));
        assert_eq!(allocator.round_to_base(dec!(51.16)).unwrap(), dec!(51));
        assert_eq!(allocator.round_to_base(dec!(51.25)).unwrap(), dec!(51.5));
    }

    // ==================== Allocation Tests ====================

    #[test]
    fn test_allocate_two_way_rounded() {
        let allocation = allocator(dec!(100), dec!(5))
            .allocate(&[dec!(2.1), dec!(2.2)])
            .unwrap();

        let Allocation::Safe(legs) = allocation else {
            panic!("expected a safe allocation");
        };
        assert_eq!(legs[0].stake, dec!(50));
        assert_eq!(legs[1].stake, dec!(50));
        assert_eq!(legs[0].profit, dec!(5));
        assert_eq!(legs[1].profit, dec!(10));
        assert_eq!(legs[0].benefit, "5.00%");
        assert_eq!(legs[1].benefit, "10.00%");
    }

    #[test]
    fn test_allocate_repairs_last_stake() {
        // Unrounded 28.57 / 71.43 round to 30 / 75, then 75 is cut to 70.
        let allocation = allocator(dec!(100), dec!(15))
            .allocate(&[dec!(4.0), dec!(1.6)])
            .unwrap();

        assert!(allocation.is_safe());
        let legs = allocation.legs();
        assert_eq!(legs[0].stake, dec!(30));
        assert_eq!(legs[1].stake, dec!(70));
        assert_eq!(legs[0].profit, dec!(20));
        assert_eq!(legs[1].profit, dec!(12));
        assert_eq!(legs[1].benefit, "12.00%");
    }

    #[test]
    fn test_allocate_repair_makes_plan_unsafe() {
        // 50 / 50 round to 60 / 60; the last stake drops to 40 and breaks even.
        let allocation = allocator(dec!(100), dec!(30))
            .allocate(&[dec!(2.5), dec!(2.5)])
            .unwrap();

        let Allocation::Unsafe { legs, reason } = allocation else {
            panic!("expected an unsafe allocation");
        };
        assert_eq!(legs[1].stake, dec!(40));
        assert_eq!(legs[1].profit, dec!(0));
        assert!(reason.contains("outcome 1"));
    }

    #[test]
    fn test_allocate_three_way_unsafe() {
        let allocation = allocator(dec!(100), dec!(20))
            .allocate(&[dec!(3.5), dec!(3.5), dec!(3.5)])
            .unwrap();

        assert!(!allocation.is_safe());
        assert_eq!(allocation.legs()[2].stake, dec!(20));
        assert_eq!(allocation.legs()[2].profit, dec!(-30));
    }

    #[test]
    fn test_allocate_invalid_odds() {
        assert!(allocator(dec!(100), dec!(5))
            .allocate(&[dec!(0), dec!(2)])
            .is_err());
    }

    #[test]
    fn test_allocate_payout_overflow_is_invalid_odds() {
        let huge = dec!(2000000000000000000000000000);
        let result = allocator(dec!(100), dec!(5)).allocate(&[huge, huge]);

        assert!(matches!(result, Err(SurebetError::InvalidOdds { .. })));
    }

    #[test]
    fn test_vanishing_probabilities_are_invalid_odds() {
        let allocator = allocator(dec!(100), dec!(5));
        let odds = [Decimal::MAX, Decimal::MAX];

        assert!(matches!(
            allocator.unrounded(&odds),
            Err(SurebetError::InvalidOdds { .. })
        ));
        assert!(allocator.guaranteed_profit(&odds).is_err());
        assert!(allocator.allocate(&odds).is_err());
    }

    #[test]
    fn test_round_to_base_overflow() {
        let allocator = allocator(dec!(100), dec!(0.0000000000000000000000000001));
        assert!(allocator.round_to_base(dec!(100000)).is_err());
    }

    #[test]
    fn test_safe_allocations_never_exceed_budget() {
        let odds_grid = [
            [dec!(2.1), dec!(2.2)],
            [dec!(2.05), dec!(2.05)],
            [dec!(1.3), dec!(5.0)],
            [dec!(4.0), dec!(1.6)],
            [dec!(3.0), dec!(1.8)],
        ];

        for odds in odds_grid {
            for total in [dec!(20), dec!(100), dec!(333)] {
                for base in [dec!(0.5), dec!(1), dec!(5), dec!(10), dec!(25)] {
                    let allocation = allocator(total, base).allocate(&odds).unwrap();
                    let staked: Decimal = allocation.legs().iter().map(|l| l.stake).sum();
                    assert!(staked <= total);
                    if allocation.is_safe() {
                        assert!(allocation.legs().iter().all(|l| l.profit > Decimal::ZERO));
                    }
                }
            }
        }
    }
}
