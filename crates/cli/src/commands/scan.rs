//! CLI command that scans an odds snapshot for surebets.
//!
//! One scan reads every bookmaker table in the snapshot directory, translates
//! their market labels and runs each market on the blocking pool. With
//! `--watch` the snapshot is re-read every `poll_interval_secs` until Ctrl+C.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use surebet_arbitrage::{MarketReport, SurebetBook, SurebetScanner};
use surebet_core::{ConfigLoader, MarketSpec, ScanConfig, SelectionPolicy};
use tokio::task::{self, JoinSet};
use tracing::{error, info, warn};

use super::report::{render, OutputFormat};
use super::snapshot::{load_snapshot, Taxonomy};

/// Arguments for the scan command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory with one JSON odds table per bookmaker.
    #[arg(long)]
    pub odds: PathBuf,

    /// Scan configuration file (TOML, with SUREBET_ env overrides).
    #[arg(long, env = "SUREBET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile overlay next to the config file (e.g. weekend for Surebet.weekend.toml).
    #[arg(long, requires = "config")]
    pub profile: Option<String>,

    /// Sport whose catalogue supplies the markets.
    #[arg(long)]
    pub sport: Option<String>,

    /// Directory with sports_and_markets.json and market_translations.json.
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,

    /// Explicit market as name:outcomes (e.g. win:3). Repeatable.
    #[arg(long = "market", value_parser = parse_market)]
    pub markets: Vec<MarketSpec>,

    /// Money spread across all legs of one surebet.
    #[arg(long)]
    pub total_stake: Option<Decimal>,

    /// Granularity stakes are rounded to.
    #[arg(long)]
    pub rounding_base: Option<Decimal>,

    /// Similarity (0-100) a matched label must exceed.
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Plan kept when several assignments qualify (last-qualifying, best-profit).
    #[arg(long)]
    pub selection: Option<SelectionPolicy>,

    /// Re-scan every poll interval until Ctrl+C.
    #[arg(long)]
    pub watch: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Shorthand for --format json.
    #[arg(long)]
    pub json: bool,
}

/// Parses a `name:outcomes` market argument.
fn parse_market(s: &str) -> Result<MarketSpec> {
    let (name, count) = s
        .rsplit_once(':')
        .with_context(|| format!("expected name:outcomes, got '{s}'"))?;
    if name.is_empty() {
        bail!("market name is empty in '{s}'");
    }
    let count: usize = count
        .parse()
        .with_context(|| format!("invalid outcome count in '{s}'"))?;
    Ok(MarketSpec::new(name, count))
}

/// Runs the scan command.
pub async fn run(args: ScanArgs) -> Result<()> {
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::parse(&args.format)?
    };

    let config = build_config(&args)?;
    let taxonomy = args.taxonomy.as_deref().map(Taxonomy::load).transpose()?;
    let markets = resolve_markets(&config, taxonomy.as_ref())?;

    info!(
        markets = markets.len(),
        total_stake = %config.total_stake,
        rounding_base = %config.rounding_base,
        threshold = config.match_threshold,
        selection = %config.selection,
        "Starting surebet scan"
    );

    let poll_interval = Duration::from_secs(config.poll_interval_secs);
    let scanner = Arc::new(SurebetScanner::new(config)?);
    let translations = taxonomy.map(|t| t.translations);

    if !args.watch {
        let book = scan_once(&scanner, &markets, &args.odds, translations.as_ref()).await?;
        println!("{}", render(&book, Utc::now(), format)?);
        return Ok(());
    }

    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match scan_once(&scanner, &markets, &args.odds, translations.as_ref()).await {
                    Ok(book) => println!("{}", render(&book, Utc::now(), format)?),
                    Err(e) => error!(error = %e, "Scan cycle failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping watch");
                break;
            }
        }
    }

    Ok(())
}

/// Merges the config file (or defaults) with command-line overrides.
fn build_config(args: &ScanArgs) -> Result<ScanConfig> {
    let mut config = match (&args.config, &args.profile) {
        (Some(path), Some(profile)) => ConfigLoader::load_with_profile(path, profile)?,
        (Some(path), None) => ConfigLoader::load(path)?,
        (None, _) => ScanConfig::default(),
    };

    if let Some(total_stake) = args.total_stake {
        config.total_stake = total_stake;
    }
    if let Some(rounding_base) = args.rounding_base {
        config.rounding_base = rounding_base;
    }
    if let Some(threshold) = args.threshold {
        config.match_threshold = threshold;
    }
    if let Some(selection) = args.selection {
        config.selection = selection;
    }
    if args.sport.is_some() {
        config.sport.clone_from(&args.sport);
    }
    if !args.markets.is_empty() {
        config.markets.clone_from(&args.markets);
    }

    config.validate()?;
    Ok(config)
}

/// Explicit markets win; otherwise the sport's catalogue entry is used.
fn resolve_markets(config: &ScanConfig, taxonomy: Option<&Taxonomy>) -> Result<Vec<MarketSpec>> {
    if !config.markets.is_empty() {
        return Ok(config.markets.clone());
    }

    let Some(sport) = config.sport.as_deref() else {
        bail!("no markets to scan: pass --market or --sport with --taxonomy");
    };
    let Some(taxonomy) = taxonomy else {
        bail!("--sport {sport} needs --taxonomy to look up its markets");
    };

    match taxonomy.catalog.markets(sport) {
        Some(markets) if !markets.is_empty() => Ok(markets),
        Some(_) => bail!("sport '{sport}' has no markets"),
        None => bail!("unknown sport '{sport}'"),
    }
}

/// Loads the snapshot and scans every market on the blocking pool.
async fn scan_once(
    scanner: &Arc<SurebetScanner>,
    markets: &[MarketSpec],
    odds_dir: &Path,
    translations: Option<&surebet_core::MarketTranslations>,
) -> Result<SurebetBook> {
    let snapshot = Arc::new(load_snapshot(odds_dir, translations)?);
    if snapshot.is_empty() {
        warn!(dir = %odds_dir.display(), "Snapshot has no odds tables");
    }

    let mut tasks = JoinSet::new();
    let mut names = HashMap::new();
    for market in markets.iter().cloned() {
        let scanner = Arc::clone(scanner);
        let snapshot = Arc::clone(&snapshot);
        let name = market.name.clone();
        let handle = tasks.spawn_blocking(move || scanner.scan_market_or_fail(&market, &snapshot));
        names.insert(handle.id(), name);
    }

    let book = collect_reports(tasks, names).await;

    info!(
        markets = book.len(),
        surebets = book.plan_count(),
        "Scan cycle complete"
    );
    Ok(book)
}

/// Joins market tasks; a task that dies is reported as a failed market.
async fn collect_reports(
    mut tasks: JoinSet<MarketReport>,
    mut names: HashMap<task::Id, String>,
) -> SurebetBook {
    let mut book = SurebetBook::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, report)) => {
                names.remove(&id);
                book.insert(report);
            }
            Err(e) => {
                let market = names
                    .remove(&e.id())
                    .unwrap_or_else(|| format!("task-{}", e.id()));
                error!(market = %market, error = %e, "Market scan task failed");
                book.insert(MarketReport::failed(market, e.to_string()));
            }
        }
    }
    book
}
