use clap::{Parser, Subcommand};

mod commands;

use commands::{AllocateArgs, MarketsArgs, ScanArgs};

#[derive(Parser)]
#[command(name = "surebet")]
#[command(about = "Cross-bookmaker surebet finder", long_about = None)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a snapshot of bookmaker odds for surebets
    Scan(ScanArgs),
    /// List the markets of a sport
    Markets(MarketsArgs),
    /// Split a total stake across explicit odds
    Allocate(AllocateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match cli.command {
        Commands::Scan(args) => commands::scan::run(args).await?,
        Commands::Markets(args) => commands::markets::run(&args)?,
        Commands::Allocate(args) => commands::allocate::run(&args)?,
    }

    Ok(())
}
