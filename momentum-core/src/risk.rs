//! Risk analyzer: drawdown statistics and realized volatility over an
//! equity curve.
//!
//! All durations are counted in bars of the curve (trading days for daily
//! data). Percentages are positive numbers in percent units (15.0 = 15%).

use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DrawdownStats {
    pub max_drawdown_pct: f64,
    /// Longest run of consecutive bars below the running peak.
    pub drawdown_duration_days: usize,
    /// Bars from the deepest trough back to its prior peak. `None` if the
    /// peak is never regained.
    pub recovery_time_days: Option<usize>,
    pub annualized_volatility_pct: f64,
}

impl DrawdownStats {
    pub fn from_curve(equity: &[f64]) -> Self {
        Self {
            max_drawdown_pct: max_drawdown(equity),
            drawdown_duration_days: drawdown_duration(equity),
            recovery_time_days: recovery_time(equity),
            annualized_volatility_pct: volatility(equity),
        }
    }
}

/// Largest peak-to-trough decline, in percent. 0.0 for flat or rising curves.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    deepest_trough(equity).map_or(0.0, |t| t.drawdown_pct)
}

/// Longest contiguous span of bars strictly below the running peak.
pub fn drawdown_duration(equity: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut run = 0usize;
    let mut longest = 0usize;
    for &value in equity {
        if value >= peak {
            peak = value;
            run = 0;
        } else {
            run += 1;
            longest = longest.max(run);
        }
    }
    longest
}

/// Bars from the maximum-drawdown trough to the first bar back at or above
/// the peak that preceded it.
///
/// `Some(0)` when the curve never draws down, `None` when the peak is not
/// regained by the end of the curve.
pub fn recovery_time(equity: &[f64]) -> Option<usize> {
    let Some(trough) = deepest_trough(equity) else {
        return Some(0);
    };
    equity[trough.index..]
        .iter()
        .position(|&v| v >= trough.peak)
}

/// Annualized volatility of per-bar returns, in percent.
///
/// Sample standard deviation (n - 1) scaled by sqrt(252). 0.0 with fewer
/// than two returns.
pub fn volatility(equity: &[f64]) -> f64 {
    let returns = periodic_returns(equity);
    if returns.len() < 2 {
        return 0.0;
    }
    std_dev(&returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Bar-over-bar simple returns. Bars following a non-positive value are skipped.
pub fn periodic_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

struct Trough {
    index: usize,
    peak: f64,
    drawdown_pct: f64,
}

/// First bar reaching the largest drawdown, with the peak it fell from.
fn deepest_trough(equity: &[f64]) -> Option<Trough> {
    let mut peak = f64::NEG_INFINITY;
    let mut deepest: Option<Trough> = None;
    for (index, &value) in equity.iter().enumerate() {
        if value > peak {
            peak = value;
        }
        if peak <= 0.0 || value >= peak {
            continue;
        }
        let drawdown_pct = (peak - value) * 100.0 / peak;
        if deepest
            .as_ref()
            .map_or(true, |d| drawdown_pct > d.drawdown_pct)
        {
            deepest = Some(Trough {
                index,
                peak,
                drawdown_pct,
            });
        }
    }
    deepest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_trough_recovery_scenario() {
        let curve = [100.0, 95.0, 85.0, 92.0, 100.0, 101.0];
        let stats = DrawdownStats::from_curve(&curve);
        assert_eq!(stats.max_drawdown_pct, 15.0);
        // Trough at index 2, back to 100 at index 4
        assert_eq!(stats.recovery_time_days, Some(2));
        assert_eq!(stats.drawdown_duration_days, 3);
    }

    #[test]
    fn never_recovered_is_none() {
        let curve = [100.0, 120.0, 90.0, 110.0];
        assert_eq!(recovery_time(&curve), None);
        assert_eq!(max_drawdown(&curve), 25.0);
        assert_eq!(drawdown_duration(&curve), 2);
    }

    #[test]
    fn rising_curve_has_no_drawdown() {
        let curve: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let stats = DrawdownStats::from_curve(&curve);
        assert_eq!(stats.max_drawdown_pct, 0.0);
        assert_eq!(stats.drawdown_duration_days, 0);
        assert_eq!(stats.recovery_time_days, Some(0));
    }

    #[test]
    fn deepest_of_several_drawdowns() {
        // 10% dip recovered, then a 20% dip recovered later.
        let curve = [100.0, 90.0, 100.0, 110.0, 88.0, 99.0, 111.0];
        assert!((max_drawdown(&curve) - 20.0).abs() < 1e-9);
        assert_eq!(recovery_time(&curve), Some(2));
        assert_eq!(drawdown_duration(&curve), 2);
    }

    #[test]
    fn constant_curve_has_zero_volatility() {
        assert_eq!(volatility(&[100.0; 30]), 0.0);
    }

    #[test]
    fn volatility_known_returns() {
        // Returns alternate +1% / -1%: sample std = 0.01 * sqrt(n / (n - 1))
        let mut curve = vec![100.0];
        for i in 0..10 {
            let r = if i % 2 == 0 { 0.01 } else { -0.01 };
            let last = *curve.last().unwrap();
            curve.push(last * (1.0 + r));
        }
        let expected = 0.01 * (10.0_f64 / 9.0).sqrt() * 252.0_f64.sqrt() * 100.0;
        assert!((volatility(&curve) - expected).abs() < 1e-9);
    }

    #[test]
    fn short_curves_are_neutral() {
        let empty = DrawdownStats::from_curve(&[]);
        assert_eq!(empty.max_drawdown_pct, 0.0);
        assert_eq!(empty.recovery_time_days, Some(0));
        assert_eq!(volatility(&[100.0, 101.0]), 0.0);
    }
}
