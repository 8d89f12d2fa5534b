//! Setup classifier: names the chart pattern an instrument is in.
//!
//! Three detectors run in a fixed priority order and the first match wins:
//! Golden Staircase, then Mean Reversion Bounce, then Breakout. A bar that
//! satisfies several patterns reports only the highest-priority one, whatever
//! the confidences. Detectors only read bars at or before the evaluation
//! index.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Bar;
use crate::indicators::IndicatorSet;

/// Detector tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Upper bound applied to every confidence.
    pub max_confidence: f64,
    /// Bounce band above the long average, as a fraction (0.03 = 3%).
    pub bounce_tolerance: f64,
    /// How many prior bars may contain the touch of the long average.
    pub touch_lookback: usize,
    /// Breakout volume must exceed this multiple of its trailing average.
    pub volume_multiple: f64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            max_confidence: 1.0,
            bounce_tolerance: 0.03,
            touch_lookback: 5,
            volume_multiple: 1.2,
        }
    }
}

/// The classified pattern, with a confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Setup {
    GoldenStaircase { confidence: f64 },
    MeanReversionBounce { confidence: f64 },
    Breakout { confidence: f64 },
    None,
}

impl Setup {
    pub fn confidence(&self) -> f64 {
        match *self {
            Self::GoldenStaircase { confidence }
            | Self::MeanReversionBounce { confidence }
            | Self::Breakout { confidence } => confidence,
            Self::None => 0.0,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GoldenStaircase { .. } => "Golden Staircase",
            Self::MeanReversionBounce { .. } => "Mean Reversion Bounce",
            Self::Breakout { .. } => "Breakout",
            Self::None => "None",
        }
    }
}

impl fmt::Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One detector per pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detector {
    GoldenStaircase,
    MeanReversionBounce,
    Breakout,
}

impl Detector {
    /// Evaluation order. Earlier entries win.
    pub const PRIORITY: [Detector; 3] = [
        Detector::GoldenStaircase,
        Detector::MeanReversionBounce,
        Detector::Breakout,
    ];

    /// Run this detector at `index`; `None` when it does not match or the
    /// data it needs is undefined.
    pub fn detect(
        &self,
        bars: &[Bar],
        indicators: &IndicatorSet,
        index: usize,
        config: &SetupConfig,
    ) -> Option<Setup> {
        let close = bars.get(index)?.close;
        let now = indicators.at(index)?;
        if close.is_nan() {
            return None;
        }

        match self {
            Detector::GoldenStaircase => {
                if now.sma_short.is_nan() || now.sma_long.is_nan() {
                    return None;
                }
                if !(close > now.sma_short && now.sma_short > now.sma_long) {
                    return None;
                }
                let short_spread = close / now.sma_short - 1.0;
                let long_spread = now.sma_short / now.sma_long - 1.0;
                let confidence =
                    (0.5 + (short_spread + long_spread) / 2.0).min(config.max_confidence);
                Some(Setup::GoldenStaircase { confidence })
            }

            Detector::MeanReversionBounce => {
                if now.sma_long.is_nan() || config.bounce_tolerance <= 0.0 {
                    return None;
                }
                let distance = close / now.sma_long - 1.0;
                if !(distance > 0.0 && distance <= config.bounce_tolerance) {
                    return None;
                }
                // Touch and recover: some prior bar closed at or below its long average.
                let from = index.saturating_sub(config.touch_lookback);
                let touched = (from..index).any(|i| {
                    let sma = indicators.sma_long[i];
                    !sma.is_nan() && bars[i].close <= sma
                });
                if !touched {
                    return None;
                }
                let confidence = (1.0 - 0.5 * distance / config.bounce_tolerance)
                    .clamp(0.0, config.max_confidence);
                Some(Setup::MeanReversionBounce { confidence })
            }

            Detector::Breakout => {
                let prev = index.checked_sub(1)?;
                let prev_close = bars[prev].close;
                let prev_short = indicators.sma_short[prev];
                if now.sma_short.is_nan() || prev_short.is_nan() || prev_close.is_nan() {
                    return None;
                }
                let crossed_above = prev_close <= prev_short && close > now.sma_short;
                if !crossed_above {
                    return None;
                }
                // Trailing average of the bars before this one.
                let avg_volume = indicators.volume_avg[prev];
                if avg_volume.is_nan() || avg_volume <= 0.0 || config.volume_multiple <= 0.0 {
                    return None;
                }
                let ratio = bars[index].volume as f64 / avg_volume;
                if ratio <= config.volume_multiple {
                    return None;
                }
                let confidence = (ratio / (2.0 * config.volume_multiple))
                    .max(0.5)
                    .min(config.max_confidence);
                Some(Setup::Breakout { confidence })
            }
        }
    }
}

/// Classify the bar at `index`: first matching detector in priority order.
pub fn classify(
    bars: &[Bar],
    indicators: &IndicatorSet,
    index: usize,
    config: &SetupConfig,
) -> Setup {
    Detector::PRIORITY
        .iter()
        .find_map(|d| d.detect(bars, indicators, index, config))
        .unwrap_or(Setup::None)
}

/// Classify the most recent bar.
pub fn classify_latest(bars: &[Bar], indicators: &IndicatorSet, config: &SetupConfig) -> Setup {
    match bars.len().checked_sub(1) {
        Some(last) => classify(bars, indicators, last, config),
        None => Setup::None,
    }
}
