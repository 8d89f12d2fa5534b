//! Momentum CLI: scan, qa and config commands.
//!
//! Commands:
//! - `scan`: load a universe, run the Alpha scan and QA every candidate
//! - `qa`: validate a single symbol
//! - `config`: print the default configuration (or universe) as TOML

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use momentum_core::gate::Check;
use momentum_runner::export::save_artifacts;
use momentum_runner::{
    render_scan, render_summary, run_from_provider, CsvProvider, PriceProvider, QaReport,
    QaRunner, ScanConfig, SymbolUniverse, SyntheticProvider,
};

#[derive(Parser)]
#[command(name = "momentum", about = "Momentum equity scanner with backtest validation")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where prices come from.
#[derive(clap::Args)]
struct Source {
    /// Directory of `<SYMBOL>.csv` files (optional `info.csv`).
    #[arg(long, conflicts_with = "synthetic")]
    data_dir: Option<PathBuf>,

    /// Use deterministic synthetic prices instead of files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Last synthetic date (YYYY-MM-DD). Defaults to today.
    #[arg(long, requires = "synthetic")]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Alpha scan and QA-validate every candidate.
    Scan {
        #[command(flatten)]
        source: Source,

        /// Symbols to scan (comma separated).
        #[arg(long, value_delimiter = ',', conflicts_with = "universe")]
        symbols: Vec<String>,

        /// Universe TOML with sector ticker lists. Defaults to the built-in US list.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Scan configuration TOML. Defaults apply to anything missing.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write JSON/CSV artifacts under this directory.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Disable parallel execution.
        #[arg(long, default_value_t = false)]
        serial: bool,
    },
    /// Backtest and grade a single symbol.
    Qa {
        #[command(flatten)]
        source: Source,

        #[arg(long)]
        symbol: String,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    Config {
        /// Print the default universe instead.
        #[arg(long, default_value_t = false)]
        universe: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Scan {
            source,
            symbols,
            universe,
            config,
            out,
            serial,
        } => run_scan(source, symbols, universe, config, out, serial),
        Commands::Qa {
            source,
            symbol,
            config,
        } => run_qa(source, &symbol, config),
        Commands::Config { universe } => {
            let text = if universe {
                SymbolUniverse::default_us().to_toml()?
            } else {
                ScanConfig::default().to_toml()?
            };
            print!("{text}");
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<ScanConfig> {
    match path {
        Some(p) => ScanConfig::from_file(&p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(ScanConfig::default()),
    }
}

fn build_provider(source: Source, config: &ScanConfig) -> Result<Box<dyn PriceProvider>> {
    if let Some(dir) = source.data_dir {
        return Ok(Box::new(CsvProvider::new(dir)?));
    }
    if !source.synthetic {
        bail!("one of --data-dir or --synthetic is required");
    }
    let end = source
        .end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--end must be YYYY-MM-DD")?
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    // Momentum needs a year of history before the backtest window starts.
    let years = config.backtest.years.saturating_add(2);
    info!(%end, years, "using synthetic prices");
    Ok(Box::new(SyntheticProvider::ending(end, years)))
}

fn run_scan(
    source: Source,
    symbols: Vec<String>,
    universe: Option<PathBuf>,
    config_path: Option<PathBuf>,
    out: Option<PathBuf>,
    serial: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let symbols = if !symbols.is_empty() {
        symbols
    } else if let Some(path) = universe {
        SymbolUniverse::from_file(&path)?.all_symbols()
    } else {
        SymbolUniverse::default_us().all_symbols()
    };

    let provider = build_provider(source, &config)?;
    let report = run_from_provider(&symbols, provider.as_ref(), &config, !serial)?;
    print!("{}", render_scan(&report));

    if let Some(dir) = out {
        let run_dir = save_artifacts(&report, &dir)?;
        println!("\nArtifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_qa(source: Source, symbol: &str, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let provider = build_provider(source, &config)?;
    let series = provider
        .fetch(symbol)
        .with_context(|| format!("failed to load {symbol}"))?;

    let report = QaRunner::new(&config).validate(&series);
    print_checks(&report);
    print!("{}", render_summary(std::slice::from_ref(&report)));
    Ok(())
}

fn print_checks(report: &QaReport) {
    let range = match (report.start_date, report.end_date) {
        (Some(a), Some(b)) => format!("{a} to {b}"),
        _ => "no bars".to_string(),
    };
    println!("{} ({}, {range}, {} bars)", report.symbol, report.rule, report.bar_count);
    println!("  verdict: {}", report.verdict.vibe);
    for check in Check::ALL {
        if let Some(outcome) = report.verdict.checks.get(&check) {
            let mark = if outcome.passed { "pass" } else { "FAIL" };
            println!(
                "  {:<14} {mark}  observed {:>8.3}  threshold {:>8.3}",
                check.as_str(),
                outcome.observed,
                outcome.threshold
            );
        }
    }
    for suggestion in &report.verdict.suggestions {
        println!("  - {suggestion}");
    }
    println!(
        "  buy & hold max drawdown {:.1}%, strategy {:.1}%\n",
        report.buy_and_hold.max_drawdown_pct, report.drawdown.max_drawdown_pct
    );
}
