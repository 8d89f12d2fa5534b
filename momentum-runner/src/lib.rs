//! Momentum Runner: scan orchestration on top of `momentum-core`.
//!
//! This crate provides:
//! - TOML scan configuration with validation and fingerprinting
//! - Price loading from CSV directories or a deterministic synthetic source
//! - Universe circuit breakers (market cap, dollar volume)
//! - The Alpha scan (momentum ranking, technical filters, setups)
//! - QA validation (simulation, drawdown, quality gate)
//! - Text summaries and JSON/CSV artifacts

pub mod alpha;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod pipeline;
pub mod qa;
pub mod report;
pub mod universe;

pub use alpha::{AlphaCandidate, AlphaReport, AlphaScanner};
pub use config::{BacktestConfig, ConfigError, RuleKind, ScanConfig};
pub use data_loader::{
    dataset_hash, load_universe, CsvProvider, DataError, LoadFailure, LoadedUniverse,
    PriceProvider, SymbolInfo, SyntheticProvider,
};
pub use pipeline::{run_from_provider, run_full_scan, RunError, ScanReport, SCHEMA_VERSION};
pub use qa::{CandidateContext, QaReport, QaRunner};
pub use report::{render_alpha, render_scan, render_summary};
pub use universe::{Exclusion, SymbolUniverse, UniverseFilter};
