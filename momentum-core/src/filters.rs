//! Technical entry filters applied to momentum candidates before setup
//! classification.
//!
//! A candidate passes when price sits above the long moving average (the
//! trend floor) and the oscillator is below the overbought ceiling. Undefined
//! indicator values never pass.

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;

/// Outcome of the technical filters for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterVerdict {
    Passed,
    /// Long moving average or oscillator still in warmup.
    InsufficientData,
    /// Close at or below the long moving average.
    BelowTrendFloor,
    /// Oscillator at or above the ceiling.
    Overbought,
}

impl FilterVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Trend-floor and overbought filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalFilter {
    pub rsi_ceiling: f64,
}

impl Default for TechnicalFilter {
    fn default() -> Self {
        Self { rsi_ceiling: 80.0 }
    }
}

impl TechnicalFilter {
    pub fn new(rsi_ceiling: f64) -> Self {
        Self { rsi_ceiling }
    }

    /// Evaluate a close against its indicator snapshot.
    pub fn evaluate(&self, close: f64, snapshot: &IndicatorSnapshot) -> FilterVerdict {
        if close.is_nan() || snapshot.sma_long.is_nan() || snapshot.rsi.is_nan() {
            return FilterVerdict::InsufficientData;
        }
        if close <= snapshot.sma_long {
            return FilterVerdict::BelowTrendFloor;
        }
        if snapshot.rsi >= self.rsi_ceiling {
            return FilterVerdict::Overbought;
        }
        FilterVerdict::Passed
    }
}
