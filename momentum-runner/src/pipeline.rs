//! Full scan: Alpha candidates, then QA validation of each candidate.
//!
//! Two entry points:
//! - `run_full_scan()`: takes a pre-loaded universe. Used by tests and the
//!   single-symbol CLI path.
//! - `run_from_provider()`: loads the universe through a provider first.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::alpha::{AlphaReport, AlphaScanner};
use crate::config::{ConfigError, ScanConfig};
use crate::data_loader::{load_universe, LoadFailure, LoadedUniverse, PriceProvider};
use crate::qa::{CandidateContext, QaReport, QaRunner};

/// Errors from the scan pipeline.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("no price data loaded for any of {requested} symbols")]
    EmptyUniverse { requested: usize },
}

/// Current schema version for persisted scan reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything one scan produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config_fingerprint: String,
    pub dataset_hash: String,
    pub config: ScanConfig,
    pub load_failures: Vec<LoadFailure>,
    pub alpha: AlphaReport,
    /// One report per Alpha candidate, in candidate order, each carrying
    /// the candidate's momentum and setup.
    pub qa: Vec<QaReport>,
}

/// Alpha scan over `universe`, then QA of every candidate.
///
/// An empty candidate list skips QA.
pub fn run_full_scan(
    universe: &LoadedUniverse,
    config: &ScanConfig,
    parallel: bool,
) -> Result<ScanReport, RunError> {
    config.validate()?;
    if universe.is_empty() {
        return Err(RunError::EmptyUniverse {
            requested: universe.len() + universe.failures.len(),
        });
    }
    let config_fingerprint = config.fingerprint()?;
    info!(fingerprint = %config_fingerprint, dataset = %universe.dataset_hash, "scan started");

    let alpha = AlphaScanner::new(config)
        .with_parallelism(parallel)
        .scan(universe);

    let qa = if alpha.candidates.is_empty() {
        info!("no alpha candidates, skipping qa");
        Vec::new()
    } else {
        let symbols: Vec<&str> = alpha.candidates.iter().map(|c| c.symbol.as_str()).collect();
        let mut reports = QaRunner::new(config)
            .with_parallelism(parallel)
            .validate_many(universe, &symbols);
        for report in &mut reports {
            report.candidate = alpha
                .candidates
                .iter()
                .find(|c| c.symbol == report.symbol)
                .map(CandidateContext::from);
        }
        reports
    };

    Ok(ScanReport {
        schema_version: SCHEMA_VERSION,
        config_fingerprint,
        dataset_hash: universe.dataset_hash.clone(),
        config: config.clone(),
        load_failures: universe.failures.clone(),
        alpha,
        qa,
    })
}

/// Load `symbols` through `provider`, then run the full scan.
pub fn run_from_provider<S: AsRef<str>>(
    symbols: &[S],
    provider: &dyn PriceProvider,
    config: &ScanConfig,
    parallel: bool,
) -> Result<ScanReport, RunError> {
    config.validate()?;
    let universe = load_universe(symbols, provider);
    run_full_scan(&universe, config, parallel)
}
