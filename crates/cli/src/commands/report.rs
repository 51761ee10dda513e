//! Text and JSON rendering of scan results.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use surebet_arbitrage::{BetPlan, MarketReport, MarketStatus, SurebetBook};

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format: '{}'. Valid formats: text, json", s)),
        }
    }
}

/// Renders a book in the requested format.
pub fn render(book: &SurebetBook, scanned_at: DateTime<Utc>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text_report(book, scanned_at)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(book)?),
    }
}

/// Formats every market, combo and event of a book as a text report.
pub fn format_text_report(book: &SurebetBook, scanned_at: DateTime<Utc>) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("===============================================================\n");
    output.push_str("                       SUREBET SCAN                            \n");
    output.push_str("===============================================================\n");
    output.push_str(&format!(
        "Scanned at: {}\n",
        scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "Markets: {}  Surebets: {}\n",
        book.len(),
        book.plan_count()
    ));

    for report in book.reports() {
        output.push('\n');
        format_market(&mut output, report);
    }

    output
}

fn format_market(output: &mut String, report: &MarketReport) {
    output.push_str(&format!("MARKET: {}\n", report.market));
    output.push_str("---------------------------------------------------------------\n");

    match &report.status {
        MarketStatus::NoSurebets => {
            output.push_str(&format!("No surebets found for {}!\n", report.market));
        }
        MarketStatus::Failed { reason } => {
            output.push_str(&format!("Scan failed: {reason}\n"));
        }
        MarketStatus::SurebetsFound => {
            for (combo, events) in &report.combos {
                output.push_str(&format!("[{combo}]\n"));
                for plan in events.values() {
                    format_plan(output, plan);
                }
            }
        }
    }

    if report.discarded > 0 {
        output.push_str(&format!(
            "Discarded {} unsafe bet(s) after rounding\n",
            report.discarded
        ));
    }
}

fn format_plan(output: &mut String, plan: &BetPlan) {
    let labels: Vec<String> = plan
        .event
        .members
        .iter()
        .map(|m| format!("{}: {}", m.bookmaker, m.label))
        .collect();
    output.push_str(&format!("  {}\n", plan.event.identity()));
    output.push_str(&format!("    matched  {}\n", labels.join(" | ")));
    output.push_str(&format!(
        "    {:<8} {:<14} {:>8} {:>10} {:>10} {:>9}\n",
        "outcome", "bookmaker", "odds", "stake", "profit", "benefit"
    ));
    for leg in &plan.legs {
        output.push_str(&format!(
            "    {:<8} {:<14} {:>8} {:>10} {:>10} {:>9}\n",
            leg.outcome + 1,
            leg.bookmaker,
            leg.odds,
            leg.stake,
            leg.profit,
            leg.benefit
        ));
    }
    output.push_str(&format!(
        "    total stake {} (staked {}), implied probability {:.4}\n",
        plan.total_stake,
        plan.staked(),
        plan.implied_sum
    ));
}
