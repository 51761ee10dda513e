//! CLI command that splits a total stake across explicit odds.

use anyhow::{bail, Context, Result};
use clap::Args;
use rust_decimal::Decimal;
use surebet_arbitrage::{implied_probability_sum, parse_token, Allocation, StakeAllocator};

/// Arguments for the allocate command.
#[derive(Args, Debug)]
pub struct AllocateArgs {
    /// Comma-separated odds, decimal or fractional (e.g. 2.1,21/20).
    #[arg(long)]
    pub odds: String,

    /// Money spread across all legs.
    #[arg(long, default_value = "100")]
    pub total_stake: Decimal,

    /// Granularity stakes are rounded to.
    #[arg(long, default_value = "5")]
    pub rounding_base: Decimal,
}

/// Runs the allocate command.
pub fn run(args: &AllocateArgs) -> Result<()> {
    let odds = parse_odds(&args.odds)?;
    let allocator = StakeAllocator::new(args.total_stake, args.rounding_base)?;
    print!("{}", format_allocation(&allocator, &odds)?);
    Ok(())
}

fn parse_odds(list: &str) -> Result<Vec<Decimal>> {
    let odds = list
        .split(',')
        .map(|token| {
            let token = token.trim();
            parse_token(token).with_context(|| format!("invalid odds '{token}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    if odds.len() < 2 {
        bail!("need at least 2 odds, got {}", odds.len());
    }
    if let Some(bad) = odds.iter().find(|&&o| o < Decimal::ONE) {
        bail!("odds must be at least 1, got {bad}");
    }
    Ok(odds)
}

fn format_allocation(allocator: &StakeAllocator, odds: &[Decimal]) -> Result<String> {
    let sum = implied_probability_sum(odds)?;
    let unrounded = allocator.unrounded(odds)?;
    let profit = allocator.guaranteed_profit(odds)?;

    let mut output = String::new();
    output.push_str(&format!("Implied probability: {:.4}\n", sum));
    if sum >= Decimal::ONE {
        output.push_str("No arbitrage: implied probability is not below 1\n");
    }
    output.push_str(&format!(
        "Unrounded stakes:   {}\n",
        unrounded
            .iter()
            .map(|s| format!("{:.2}", s))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    output.push_str(&format!("Guaranteed profit:  {:.2}\n\n", profit));

    let allocation = allocator.allocate(odds)?;
    output.push_str(&format!(
        "{:<8} {:>8} {:>10} {:>10} {:>9}\n",
        "outcome", "odds", "stake", "profit", "benefit"
    ));
    for leg in allocation.legs() {
        output.push_str(&format!(
            "{:<8} {:>8} {:>10} {:>10} {:>9}\n",
            leg.outcome + 1,
            leg.odds,
            leg.stake,
            leg.profit,
            leg.benefit
        ));
    }

    match &allocation {
        Allocation::Safe(_) => output.push_str("Safe after rounding\n"),
        Allocation::Unsafe { reason, .. } => {
            output.push_str(&format!("Unsafe after rounding: {reason}\n"));
        }
    }
    Ok(output)
}
