//! Serializable scan configuration.
//!
//! Every tunable of the scan lives here with its production default. The
//! configuration is loaded from TOML, validated once, and then handed to the
//! core as plain parameters. The core never reads files or the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use momentum_core::filters::TechnicalFilter;
use momentum_core::gate::GateThresholds;
use momentum_core::indicators::IndicatorConfig;
use momentum_core::momentum::MomentumConfig;
use momentum_core::setup::SetupConfig;
use momentum_core::signal::{MaCrossover, PriceAboveAverages, SignalRule};
use momentum_core::simulator::SimulatorConfig;

use crate::universe::UniverseFilter;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("{field} must be >= 1")]
    ZeroWindow { field: &'static str },

    #[error("short window ({short}) must be smaller than long window ({long})")]
    WindowOrder { short: usize, long: usize },

    #[error("{field} = {value} is out of range ({expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Entry/exit rule replayed by QA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Golden cross of the short over the long average enters, death cross exits.
    #[default]
    MaCrossover,
    /// Close above both averages enters, close below the long average exits.
    PriceAboveAverages,
}

impl RuleKind {
    pub fn build(&self, indicators: &IndicatorConfig) -> Box<dyn SignalRule> {
        match self {
            Self::MaCrossover => Box::new(MaCrossover::new(
                indicators.short_window,
                indicators.long_window,
            )),
            Self::PriceAboveAverages => Box::new(PriceAboveAverages),
        }
    }
}

/// Backtest horizon, rule and protective exits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Trailing years of history replayed by QA.
    pub years: u32,
    pub rule: RuleKind,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub initial_capital: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let sim = SimulatorConfig::default();
        Self {
            years: 3,
            rule: RuleKind::default(),
            stop_loss_pct: sim.stop_loss_pct,
            take_profit_pct: sim.take_profit_pct,
            initial_capital: sim.initial_capital,
        }
    }
}

impl BacktestConfig {
    /// Longest replay horizon accepted by validation.
    pub const MAX_YEARS: u32 = 50;

    pub fn simulator(&self) -> SimulatorConfig {
        SimulatorConfig {
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            initial_capital: self.initial_capital,
        }
    }
}

/// Full configuration for an Alpha scan followed by QA validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub indicators: IndicatorConfig,
    pub filters: TechnicalFilter,
    pub momentum: MomentumConfig,
    pub setup: SetupConfig,
    pub backtest: BacktestConfig,
    pub gate: GateThresholds,
    pub universe: UniverseFilter,
}

impl ScanConfig {
    /// Load a configuration from a TOML file. Missing sections keep defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Reject parameter combinations the core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        for (field, value) in [
            ("indicators.short_window", ind.short_window),
            ("indicators.long_window", ind.long_window),
            ("indicators.rsi_window", ind.rsi_window),
            ("indicators.volume_window", ind.volume_window),
            ("momentum.lookback_months", self.momentum.lookback_months),
            ("universe.volume_window", self.universe.volume_window),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroWindow { field });
            }
        }
        if ind.short_window >= ind.long_window {
            return Err(ConfigError::WindowOrder {
                short: ind.short_window,
                long: ind.long_window,
            });
        }
        if self.backtest.years == 0 {
            return Err(ConfigError::ZeroWindow {
                field: "backtest.years",
            });
        }
        if self.backtest.years > BacktestConfig::MAX_YEARS {
            return Err(ConfigError::OutOfRange {
                field: "backtest.years",
                value: f64::from(self.backtest.years),
                expected: "1 <= x <= 50",
            });
        }

        check_range("momentum.top_fraction", self.momentum.top_fraction, 0.0, 1.0, "0 < x <= 1", false)?;
        check_range("filters.rsi_ceiling", self.filters.rsi_ceiling, 0.0, 100.0, "0 <= x <= 100", true)?;
        check_range("setup.max_confidence", self.setup.max_confidence, 0.0, 1.0, "0 < x <= 1", false)?;
        check_range("setup.bounce_tolerance", self.setup.bounce_tolerance, 0.0, 1.0, "0 < x <= 1", false)?;
        check_range("backtest.stop_loss_pct", self.backtest.stop_loss_pct, 0.0, 1.0, "0 < x <= 1", false)?;
        check_range("gate.min_win_rate", self.gate.min_win_rate, 0.0, 1.0, "0 <= x <= 1", true)?;

        if !(self.setup.volume_multiple > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "setup.volume_multiple",
                value: self.setup.volume_multiple,
                expected: "x > 0",
            });
        }
        if !(self.backtest.take_profit_pct > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "backtest.take_profit_pct",
                value: self.backtest.take_profit_pct,
                expected: "x > 0",
            });
        }
        if !(self.backtest.initial_capital > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "backtest.initial_capital",
                value: self.backtest.initial_capital,
                expected: "x > 0",
            });
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the configuration.
    ///
    /// Two scans with identical configs share a fingerprint, so reports can
    /// be matched to the parameters that produced them.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    low: f64,
    high: f64,
    expected: &'static str,
    low_inclusive: bool,
) -> Result<(), ConfigError> {
    let above_low = if low_inclusive { value >= low } else { value > low };
    if above_low && value <= high {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_constants() {
        let c = ScanConfig::default();
        assert_eq!(c.indicators.long_window, 200);
        assert_eq!(c.indicators.short_window, 60);
        assert_eq!(c.indicators.rsi_window, 14);
        assert_eq!(c.filters.rsi_ceiling, 80.0);
        assert_eq!(c.momentum.lookback_months, 12);
        assert_eq!(c.momentum.skip_months, 1);
        assert_eq!(c.backtest.years, 3);
        assert_eq!(c.gate.max_drawdown_pct, 15.0);
        assert_eq!(c.gate.min_win_rate, 0.60);
        assert_eq!(c.gate.min_trades, 5);
        assert_eq!(c.gate.min_profit_factor, 1.5);
        assert_eq!(c.universe.min_market_cap, 2.0e9);
        assert_eq!(c.universe.min_dollar_volume, 1.0e7);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ScanConfig::from_toml(
            r#"
            [indicators]
            short_window = 50

            [gate]
            min_trades = 8
            "#,
        )
        .unwrap();
        assert_eq!(c.indicators.short_window, 50);
        assert_eq!(c.indicators.long_window, 200);
        assert_eq!(c.gate.min_trades, 8);
        assert_eq!(c.gate.min_profit_factor, 1.5);
    }

    #[test]
    fn toml_roundtrip() {
        let c = ScanConfig::default();
        let text = c.to_toml().unwrap();
        assert_eq!(ScanConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn rule_is_selectable() {
        let c = ScanConfig::from_toml("[backtest]\nrule = \"price_above_averages\"\n").unwrap();
        assert_eq!(c.backtest.rule, RuleKind::PriceAboveAverages);
        assert_eq!(c.backtest.rule.build(&c.indicators).name(), "price_above_averages");
        let d = ScanConfig::default();
        assert_eq!(d.backtest.rule.build(&d.indicators).name(), "ma_crossover");
    }

    #[test]
    fn inverted_windows_rejected() {
        let err = ScanConfig::from_toml("[indicators]\nshort_window = 250\n").unwrap_err();
        assert!(matches!(err, ConfigError::WindowOrder { short: 250, long: 200 }));
    }

    #[test]
    fn zero_window_rejected() {
        let err = ScanConfig::from_toml("[indicators]\nrsi_window = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroWindow { field: "indicators.rsi_window" }));
    }

    #[test]
    fn out_of_range_fraction_rejected() {
        let err = ScanConfig::from_toml("[momentum]\ntop_fraction = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "momentum.top_fraction", .. }));
        let err = ScanConfig::from_toml("[backtest]\nstop_loss_pct = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "backtest.stop_loss_pct", .. }));
    }

    #[test]
    fn backtest_years_bounded() {
        let err = ScanConfig::from_toml("[backtest]\nyears = 4000000000\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "backtest.years", .. }));
        assert!(ScanConfig::from_toml("[backtest]\nyears = 50\n").is_ok());
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = ScanConfig::from_toml("[indicators\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let a = ScanConfig::default();
        let mut b = ScanConfig::default();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
        b.backtest.stop_loss_pct = 0.07;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScanConfig::from_file(Path::new("/nonexistent/momentum.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
