//! CLI command that lists the markets of a sport.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use surebet_core::MarketSpec;

use super::snapshot::Taxonomy;

/// Arguments for the markets command.
#[derive(Args, Debug)]
pub struct MarketsArgs {
    /// Directory with sports_and_markets.json and market_translations.json.
    #[arg(long)]
    pub taxonomy: PathBuf,

    /// Sport to list; all sports when omitted.
    #[arg(long)]
    pub sport: Option<String>,

    /// Also show each bookmaker's label for the market.
    #[arg(long)]
    pub bookmaker: Vec<String>,
}

/// Runs the markets command.
pub fn run(args: &MarketsArgs) -> Result<()> {
    let taxonomy = Taxonomy::load(&args.taxonomy)?;
    print!("{}", format_markets(&taxonomy, args.sport.as_deref(), &args.bookmaker)?);
    Ok(())
}

fn format_markets(taxonomy: &Taxonomy, sport: Option<&str>, bookmakers: &[String]) -> Result<String> {
    let sports: Vec<String> = match sport {
        Some(sport) => vec![sport.to_string()],
        None => taxonomy.catalog.sports().map(str::to_string).collect(),
    };

    let mut output = String::new();
    for sport in &sports {
        let markets = taxonomy
            .catalog
            .markets(sport)
            .with_context(|| format!("unknown sport '{sport}'"))?;

        output.push_str(&format!("{sport}\n"));
        format_group(&mut output, "two-way", &markets, 2, taxonomy, bookmakers);
        format_group(&mut output, "three-way", &markets, 3, taxonomy, bookmakers);
    }
    Ok(output)
}

fn format_group(
    output: &mut String,
    title: &str,
    markets: &[MarketSpec],
    outcome_count: usize,
    taxonomy: &Taxonomy,
    bookmakers: &[String],
) {
    output.push_str(&format!("  {title}:\n"));
    for market in markets.iter().filter(|m| m.outcome_count == outcome_count) {
        output.push_str(&format!("    {}", market.name));
        for bookmaker in bookmakers {
            let label = taxonomy.translations.to_site_market(&market.name, bookmaker);
            output.push_str(&format!("  [{bookmaker}: {label}]"));
        }
        output.push('\n');
    }
}
