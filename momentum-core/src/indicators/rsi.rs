//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses, seeded by the
//! simple average of the first `period` changes. The first bar has no
//! previous close and counts as a zero change, so the first value lands on
//! bar `period - 1`, the same bar as a moving average of equal window.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0.

use super::Indicator;
use crate::domain::{Bar, PriceSeries};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        // changes[0] stays zero: bar 0 has no previous close.
        let mut changes = vec![0.0; n];
        for i in 1..n {
            changes[i] = bars[i].close - bars[i - 1].close;
        }

        // Seed: average gain and average loss over first `period` changes
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[..self.period] {
            if ch.is_nan() {
                return result;
            }
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;

        result[self.period - 1] = compute_rsi(avg_gain, avg_loss);

        // Wilder smoothing for subsequent values
        let alpha = 1.0 / self.period as f64;
        for i in self.period..n {
            if changes[i].is_nan() {
                for val in result.iter_mut().skip(i) {
                    *val = f64::NAN;
                }
                return result;
            }

            let gain = changes[i].max(0.0);
            let loss = (-changes[i]).max(0.0);

            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

/// Wilder RSI of the closes, NaN for the first `window - 1` bars.
pub fn oscillator(series: &PriceSeries, window: usize) -> Vec<f64> {
    Rsi::new(window).compute(series.bars())
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // No losses in the window, including a perfectly flat one.
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[2], 100.0, 1e-6);
        assert_approx(result[5], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[2], 0.0, 1e-6);
        assert_approx(result[5], 0.0, 1e-6);
    }

    #[test]
    fn rsi_flat_maps_to_100() {
        let bars = make_bars(&[50.0; 6]);
        let result = Rsi::new(3).compute(&bars);
        assert_eq!(result[2], 100.0);
        assert_eq!(result[5], 100.0);
    }

    #[test]
    fn rsi_seed_value() {
        // Changes: 0 (first bar), +0.34, -0.25, -0.48, +0.72
        // Seed over first 3: avg_gain = 0.34/3, avg_loss = 0.25/3
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 100.0 - 100.0 / (1.0 + 0.34 / 0.25), 1e-9);

        // Wilder step: avg = (prev * 2 + current) / 3
        let avg_gain = (0.34 / 3.0 * 2.0) / 3.0;
        let avg_loss = (0.25 / 3.0 * 2.0 + 0.48) / 3.0;
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + avg_gain / avg_loss), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&bars);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!(
                    (0.0..=100.0).contains(&v),
                    "RSI out of bounds at bar {i}: {v}"
                );
            }
        }
    }

    #[test]
    fn rsi_nan_propagation() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        bars[2].close = f64::NAN;
        let result = Rsi::new(3).compute(&bars);
        // NaN in seed window → all NaN
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_short_series_is_undefined() {
        let series = PriceSeries::new("TEST", make_bars(&[100.0, 101.0, 102.0])).unwrap();
        assert!(oscillator(&series, 14).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 13);
    }
}
