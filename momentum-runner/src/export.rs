//! Artifact export: JSON scan reports and CSV tables.
//!
//! A saved scan is a directory holding:
//! - `scan.json`: the full `ScanReport`, with `schema_version`
//! - `candidates.csv`: the Alpha candidates
//! - `summary.txt`: the terminal summary
//! - `qa/<SYMBOL>_trades.csv` and `qa/<SYMBOL>_equity.csv` per QA report
//!
//! Reports with a newer schema version than this build are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use momentum_core::domain::Trade;
use momentum_core::simulator::EquityPoint;

use crate::alpha::AlphaCandidate;
use crate::pipeline::{ScanReport, SCHEMA_VERSION};
use crate::report::render_scan;

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &ScanReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ScanReport to JSON")
}

/// Deserialize a `ScanReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ScanReport> {
    let report: ScanReport =
        serde_json::from_str(json).context("failed to deserialize ScanReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Trade tape for one symbol.
pub fn export_trades_csv(symbol: &str, trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_bar",
        "entry_date",
        "entry_price",
        "exit_bar",
        "exit_date",
        "exit_price",
        "exit_reason",
        "return_pct",
        "bars_held",
    ])?;
    for t in trades {
        wtr.write_record([
            symbol.to_string(),
            t.entry_index.to_string(),
            t.entry_date.to_string(),
            format!("{:.4}", t.entry_price),
            t.exit_index.to_string(),
            t.exit_date.to_string(),
            format!("{:.4}", t.exit_price),
            t.exit_reason.as_str().to_string(),
            format!("{:.6}", t.return_pct),
            t.bars_held().to_string(),
        ])?;
    }
    finish(wtr)
}

pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity"])?;
    for p in equity_curve {
        wtr.write_record([p.date.to_string(), format!("{:.2}", p.equity)])?;
    }
    finish(wtr)
}

pub fn export_candidates_csv(candidates: &[AlphaCandidate]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "date",
        "momentum_score",
        "setup",
        "confidence",
        "price",
        "sma_short",
        "sma_long",
        "rsi",
    ])?;
    for c in candidates {
        wtr.write_record([
            c.symbol.clone(),
            c.date.to_string(),
            format!("{:.6}", c.momentum_score),
            c.setup.name().to_string(),
            format!("{:.4}", c.confidence),
            format!("{:.4}", c.latest_price),
            format!("{:.4}", c.sma_short),
            format!("{:.4}", c.sma_long),
            format!("{:.2}", c.rsi),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save a scan under `output_dir/scan_{timestamp}/`. Returns the created directory.
pub fn save_artifacts(report: &ScanReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("scan_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    let qa_dir = run_dir.join("qa");
    std::fs::create_dir_all(&qa_dir)
        .with_context(|| format!("failed to create artifact dir: {}", qa_dir.display()))?;

    std::fs::write(run_dir.join("scan.json"), export_json(report)?)?;
    std::fs::write(
        run_dir.join("candidates.csv"),
        export_candidates_csv(&report.alpha.candidates)?,
    )?;
    std::fs::write(run_dir.join("summary.txt"), render_scan(report))?;

    for qa in &report.qa {
        std::fs::write(
            qa_dir.join(format!("{}_trades.csv", qa.symbol)),
            export_trades_csv(&qa.symbol, &qa.trades)?,
        )?;
        std::fs::write(
            qa_dir.join(format!("{}_equity.csv", qa.symbol)),
            export_equity_csv(&qa.equity_curve)?,
        )?;
    }

    Ok(run_dir)
}

/// Load a `ScanReport` from an artifact directory's scan.json.
pub fn load_artifacts(dir: &Path) -> Result<ScanReport> {
    let path = dir.join("scan.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
