//! Scan universe: which symbols to load, and which are liquid enough to trade.
//!
//! [`SymbolUniverse`] is a sector-organized ticker list stored as TOML.
//! [`UniverseFilter`] holds the circuit breakers applied before momentum
//! ranking: a market-cap floor (only when listing metadata is available) and
//! a dollar-volume floor computed from the series itself.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use momentum_core::domain::PriceSeries;

use crate::config::ConfigError;
use crate::data_loader::SymbolInfo;

/// Circuit-breaker floors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseFilter {
    /// Minimum market capitalisation in USD.
    pub min_market_cap: f64,
    /// Minimum average daily traded value in USD.
    pub min_dollar_volume: f64,
    /// Trailing bars averaged for the dollar-volume estimate.
    pub volume_window: usize,
}

impl Default for UniverseFilter {
    fn default() -> Self {
        Self {
            min_market_cap: 2.0e9,
            min_dollar_volume: 1.0e7,
            volume_window: 20,
        }
    }
}

/// Why a symbol was dropped from the universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Exclusion {
    MarketCap { market_cap: f64 },
    DollarVolume { dollar_volume: f64 },
    NoBars,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarketCap { market_cap } => write!(f, "market cap ${market_cap:.0} below floor"),
            Self::DollarVolume { dollar_volume } => {
                write!(f, "dollar volume ${dollar_volume:.0} below floor")
            }
            Self::NoBars => write!(f, "no bars"),
        }
    }
}

impl UniverseFilter {
    /// Trailing mean share volume times the last close.
    ///
    /// Uses all bars when fewer than `volume_window` exist. `None` for an
    /// empty series.
    pub fn dollar_volume(&self, series: &PriceSeries) -> Option<f64> {
        let bars = series.bars();
        let last = bars.last()?;
        let window = self.volume_window.max(1).min(bars.len());
        let tail = &bars[bars.len() - window..];
        let mean_volume = tail.iter().map(|b| b.volume as f64).sum::<f64>() / window as f64;
        Some(mean_volume * last.close)
    }

    /// Check one symbol against both floors.
    pub fn check(&self, series: &PriceSeries, info: Option<&SymbolInfo>) -> Result<(), Exclusion> {
        if let Some(market_cap) = info.and_then(|i| i.market_cap) {
            if market_cap < self.min_market_cap {
                return Err(Exclusion::MarketCap { market_cap });
            }
        }
        let dollar_volume = self.dollar_volume(series).ok_or(Exclusion::NoBars)?;
        if dollar_volume < self.min_dollar_volume {
            return Err(Exclusion::DollarVolume { dollar_volume });
        }
        Ok(())
    }

    /// Split a universe into eligible series and exclusions.
    pub fn apply<'a>(
        &self,
        series: &'a [PriceSeries],
        info: &BTreeMap<String, SymbolInfo>,
    ) -> (Vec<&'a PriceSeries>, Vec<(String, Exclusion)>) {
        let mut eligible = Vec::new();
        let mut excluded = Vec::new();
        for s in series {
            match self.check(s, info.get(s.symbol())) {
                Ok(()) => eligible.push(s),
                Err(reason) => {
                    debug!(symbol = s.symbol(), %reason, "excluded by circuit breaker");
                    excluded.push((s.symbol().to_string(), reason));
                }
            }
        }
        info!(
            eligible = eligible.len(),
            excluded = excluded.len(),
            "circuit breakers applied"
        );
        (eligible, excluded)
    }
}

/// Sector-organized ticker list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolUniverse {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl SymbolUniverse {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// All tickers across sectors, deduplicated, in sector then list order.
    pub fn all_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for ticker in self.sectors.values().flatten() {
            if !out.contains(ticker) {
                out.push(ticker.clone());
            }
        }
        out
    }

    pub fn sector_symbols(&self, sector: &str) -> Option<&[String]> {
        self.sectors.get(sector).map(|v| v.as_slice())
    }

    pub fn symbol_count(&self) -> usize {
        self.all_symbols().len()
    }

    /// Large-cap US equities grouped by sector.
    pub fn default_us() -> Self {
        let sector = |tickers: &[&str]| tickers.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        let mut sectors = BTreeMap::new();
        sectors.insert(
            "Technology".into(),
            sector(&["AAPL", "MSFT", "GOOGL", "NVDA", "META", "AVGO", "CRM", "ADBE", "ORCL", "AMD"]),
        );
        sectors.insert(
            "Healthcare".into(),
            sector(&["JNJ", "UNH", "PFE", "ABBV", "MRK", "LLY", "TMO", "ABT"]),
        );
        sectors.insert(
            "Finance".into(),
            sector(&["JPM", "BAC", "WFC", "GS", "MS", "BLK", "SCHW", "AXP", "V", "MA"]),
        );
        sectors.insert(
            "Energy".into(),
            sector(&["XOM", "CVX", "COP", "SLB", "EOG", "MPC", "PSX", "VLO"]),
        );
        sectors.insert(
            "Consumer".into(),
            sector(&["AMZN", "TSLA", "WMT", "PG", "KO", "PEP", "COST", "HD", "MCD", "NKE"]),
        );
        sectors.insert(
            "Industrials".into(),
            sector(&["CAT", "DE", "HON", "GE", "UNP", "RTX", "LMT", "UPS"]),
        );
        Self { sectors }
    }
}
