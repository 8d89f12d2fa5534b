//! Price loading for the scan.
//!
//! A [`PriceProvider`] turns a symbol into a validated [`PriceSeries`] plus
//! optional listing metadata. Two providers ship with the runner:
//! - [`CsvProvider`] reads one `<SYMBOL>.csv` per instrument from a directory
//! - [`SyntheticProvider`] generates a deterministic random walk per symbol
//!
//! [`load_universe`] loads a whole symbol list. A symbol that fails to load
//! is logged and recorded; it never aborts the scan.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use momentum_core::domain::{Bar, PriceSeries, SeriesError};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no price file for '{symbol}' (expected {path})")]
    NotFound { symbol: String, path: PathBuf },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no bars for '{symbol}'")]
    Empty { symbol: String },

    #[error(transparent)]
    Invalid(#[from] SeriesError),
}

/// Listing metadata used by the universe circuit breakers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    /// Market capitalisation in USD.
    pub market_cap: Option<f64>,
}

/// Source of daily bars and listing metadata.
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, symbol: &str) -> Result<PriceSeries, DataError>;

    /// Listing metadata, when the source has any.
    fn info(&self, _symbol: &str) -> Option<SymbolInfo> {
        None
    }
}

// ── CSV ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Reads `<dir>/<SYMBOL>.csv` files with a `date,open,high,low,close,volume`
/// header, and an optional `<dir>/info.csv` with a `symbol,market_cap`
/// header. Extra `info.csv` columns are ignored.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
    info: HashMap<String, SymbolInfo>,
}

impl CsvProvider {
    pub const INFO_FILE: &'static str = "info.csv";

    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DataError> {
        let dir = dir.into();
        let info_path = dir.join(Self::INFO_FILE);
        let info = if info_path.exists() {
            read_info(&info_path)?
        } else {
            HashMap::new()
        };
        debug!(dir = %dir.display(), listings = info.len(), "csv provider ready");
        Ok(Self { dir, info })
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::NotFound {
                symbol: symbol.to_string(),
                path,
            });
        }

        let csv_err = |source| DataError::Csv {
            path: path.clone(),
            source,
        };
        let mut reader = csv::Reader::from_path(&path).map_err(csv_err)?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvBar>() {
            let row = row.map_err(csv_err)?;
            bars.push(Bar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }
        Ok(PriceSeries::new(symbol, bars)?)
    }

    fn info(&self, symbol: &str) -> Option<SymbolInfo> {
        self.info.get(symbol).cloned()
    }
}

fn read_info(path: &Path) -> Result<HashMap<String, SymbolInfo>, DataError> {
    let csv_err = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut out = HashMap::new();
    for row in reader.deserialize::<SymbolInfo>() {
        let row = row.map_err(csv_err)?;
        out.insert(row.symbol.clone(), row);
    }
    Ok(out)
}

// ── Synthetic ────────────────────────────────────────────────────────

/// Deterministic random-walk bars for development and tests.
///
/// Each symbol gets its own seed (BLAKE3 of the symbol name) and a small
/// per-symbol drift, so a synthetic universe contains both trending and
/// drifting names. Weekends are skipped.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `years` of history ending at `end`.
    pub fn ending(end: NaiveDate, years: u32) -> Self {
        let start = end
            .checked_sub_months(chrono::Months::new(years.saturating_mul(12)))
            .unwrap_or(end);
        Self { start, end }
    }

    fn rng(symbol: &str, salt: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(salt.as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    pub fn generate(&self, symbol: &str) -> Vec<Bar> {
        let mut rng = Self::rng(symbol, "bars");
        let drift: f64 = rng.gen_range(-0.0005..0.0015);

        let mut bars = Vec::new();
        let mut price = rng.gen_range(20.0..300.0_f64);
        let mut current = self.start;

        while current <= self.end {
            let weekday = current.weekday();
            if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
                current += chrono::Duration::days(1);
                continue;
            }

            let daily_return: f64 = drift + rng.gen_range(-0.02..0.02);
            let open = price * (1.0 + rng.gen_range(-0.003..0.003));
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += chrono::Duration::days(1);
        }

        bars
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str) -> Result<PriceSeries, DataError> {
        let bars = self.generate(symbol);
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }
        Ok(PriceSeries::new(symbol, bars)?)
    }

    fn info(&self, symbol: &str) -> Option<SymbolInfo> {
        let mut rng = Self::rng(symbol, "info");
        Some(SymbolInfo {
            symbol: symbol.to_string(),
            market_cap: Some(rng.gen_range(1.0e9..5.0e11)),
        })
    }
}

// ── Universe loading ─────────────────────────────────────────────────

/// A symbol that could not be loaded, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub symbol: String,
    pub reason: String,
}

/// Everything loaded for one scan.
#[derive(Debug, Clone, Default)]
pub struct LoadedUniverse {
    /// Loaded series in request order.
    pub series: Vec<PriceSeries>,
    pub info: BTreeMap<String, SymbolInfo>,
    pub failures: Vec<LoadFailure>,
    /// BLAKE3 over every loaded bar.
    pub dataset_hash: String,
}

impl LoadedUniverse {
    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.iter().find(|s| s.symbol() == symbol)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Load every symbol through `provider`. Duplicate symbols are loaded once.
pub fn load_universe<S: AsRef<str>>(symbols: &[S], provider: &dyn PriceProvider) -> LoadedUniverse {
    info!(provider = provider.name(), symbols = symbols.len(), "loading price data");

    let mut seen = HashSet::new();
    let mut loaded = LoadedUniverse::default();

    for symbol in symbols.iter().map(AsRef::as_ref) {
        if !seen.insert(symbol) {
            continue;
        }
        match provider.fetch(symbol) {
            Ok(series) => {
                debug!(symbol, bars = series.len(), "loaded");
                if let Some(meta) = provider.info(symbol) {
                    loaded.info.insert(symbol.to_string(), meta);
                }
                loaded.series.push(series);
            }
            Err(e) => {
                warn!(symbol, error = %e, "failed to load price data");
                loaded.failures.push(LoadFailure {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    loaded.dataset_hash = dataset_hash(&loaded.series);
    info!(
        loaded = loaded.series.len(),
        failed = loaded.failures.len(),
        "price data ready"
    );
    loaded
}

/// Deterministic BLAKE3 hash over all bar data, in sorted symbol order.
pub fn dataset_hash(series: &[PriceSeries]) -> String {
    let mut hasher = blake3::Hasher::new();

    let mut sorted: Vec<&PriceSeries> = series.iter().collect();
    sorted.sort_by(|a, b| a.symbol().cmp(b.symbol()));

    for s in sorted {
        hasher.update(s.symbol().as_bytes());
        for bar in s.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}
