//! Indicator engine: moving averages and the RSI oscillator.
//!
//! Indicators are pure functions: bar history in, numeric series out, same
//! length as the input. Warmup bars hold `f64::NAN`, the "undefined"
//! sentinel. No indicator value at bar t may depend on bars after t.

pub mod rsi;
pub mod sma;
pub mod volume;

pub use rsi::{oscillator, Rsi};
pub use sma::{moving_average, Sma};
pub use volume::VolumeSma;

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, PriceSeries};

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_60", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that stay undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Window lengths used system-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Momentum trigger line.
    pub short_window: usize,
    /// Trend floor.
    pub long_window: usize,
    pub rsi_window: usize,
    /// Trailing window for average volume.
    pub volume_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            short_window: 60,
            long_window: 200,
            rsi_window: 14,
            volume_window: 20,
        }
    }
}

/// Per-bar indicator values aligned 1:1 with a `PriceSeries`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    pub sma_short: Vec<f64>,
    pub sma_long: Vec<f64>,
    pub rsi: Vec<f64>,
    pub volume_avg: Vec<f64>,
}

/// The indicator values of a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub sma_short: f64,
    pub sma_long: f64,
    pub rsi: f64,
    pub volume_avg: f64,
}

impl IndicatorSnapshot {
    /// True once both moving averages have left warmup.
    pub fn has_averages(&self) -> bool {
        !self.sma_short.is_nan() && !self.sma_long.is_nan()
    }
}

impl IndicatorSet {
    /// Compute every indicator for a series.
    ///
    /// Windows must be >= 1; the runner validates its configuration first.
    pub fn compute(series: &PriceSeries, config: &IndicatorConfig) -> Self {
        let bars = series.bars();
        Self {
            sma_short: Sma::new(config.short_window).compute(bars),
            sma_long: Sma::new(config.long_window).compute(bars),
            rsi: Rsi::new(config.rsi_window).compute(bars),
            volume_avg: VolumeSma::new(config.volume_window).compute(bars),
        }
    }

    pub fn len(&self) -> usize {
        self.sma_short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma_short.is_empty()
    }

    /// Values at `index`, or `None` past the end.
    pub fn at(&self, index: usize) -> Option<IndicatorSnapshot> {
        Some(IndicatorSnapshot {
            sma_short: *self.sma_short.get(index)?,
            sma_long: *self.sma_long.get(index)?,
            rsi: *self.rsi.get(index)?,
            volume_avg: *self.volume_avg.get(index)?,
        })
    }

    /// Values at the most recent bar.
    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.len().checked_sub(1).and_then(|i| self.at(i))
    }
}

/// Rolling mean of a value slice; NaN until `period` values are available
/// and wherever the window contains a NaN.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    // Compute initial window sum
    let mut sum = 0.0;
    let mut nan_in_window = false;
    for &v in values.iter().take(period) {
        if v.is_nan() {
            nan_in_window = true;
        }
        sum += v;
    }

    if !nan_in_window {
        result[period - 1] = sum / period as f64;
    }

    // Roll the window forward
    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];
        sum = sum - leaving + entering;

        // NaN poisons the running sum, so rescan the window when one is near.
        if entering.is_nan() || leaving.is_nan() || nan_in_window {
            nan_in_window = false;
            sum = 0.0;
            for &v in &values[(i + 1 - period)..=i] {
                if v.is_nan() {
                    nan_in_window = true;
                }
                sum += v;
            }
            if nan_in_window {
                continue;
            }
        }

        result[i] = sum / period as f64;
    }

    result
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
