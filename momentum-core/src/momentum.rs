//! Momentum scorer: 12-1 month-end total return, ranking and top-fraction selection.
//!
//! The daily series is resampled to the last close of each calendar month
//! (the current, possibly partial, month included). The score is the total
//! return from `lookback + skip` month-ends ago to `skip` month-ends ago, so
//! price action inside the most recent `skip` months never moves it.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;

/// Momentum window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub lookback_months: usize,
    pub skip_months: usize,
    /// Fraction of the ranked universe kept as candidates.
    pub top_fraction: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback_months: 12,
            skip_months: 1,
            top_fraction: 0.10,
        }
    }
}

/// Relative-strength score of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumScore {
    pub symbol: String,
    /// Total return as a fraction (0.25 = +25%). 0.0 when history is short.
    pub score: f64,
    /// Completed month-to-month intervals in the series.
    pub months_available: usize,
    /// False when the series could not cover `lookback + skip` months.
    pub sufficient_history: bool,
}

impl MomentumScore {
    fn insufficient(symbol: &str, months_available: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            score: 0.0,
            months_available,
            sufficient_history: false,
        }
    }
}

/// Last close of every calendar month present in the series, in date order.
pub fn month_end_closes(series: &PriceSeries) -> Vec<(NaiveDate, f64)> {
    let mut out: Vec<(NaiveDate, f64)> = Vec::new();
    for bar in series.bars() {
        match out.last_mut() {
            Some((date, close))
                if date.year() == bar.date.year() && date.month() == bar.date.month() =>
            {
                *date = bar.date;
                *close = bar.close;
            }
            _ => out.push((bar.date, bar.close)),
        }
    }
    out
}

/// Score a series with the lookback-minus-skip convention.
///
/// Short history fails closed: score 0.0 with `sufficient_history = false`.
pub fn score(series: &PriceSeries, lookback_months: usize, skip_months: usize) -> MomentumScore {
    let month_ends = month_end_closes(series);
    let months_available = month_ends.len().saturating_sub(1);
    let required = lookback_months + skip_months;

    if month_ends.is_empty() || lookback_months == 0 || months_available < required {
        return MomentumScore::insufficient(series.symbol(), months_available);
    }

    let last = month_ends.len() - 1;
    let end_close = month_ends[last - skip_months].1;
    let start_close = month_ends[last - required].1;

    MomentumScore {
        symbol: series.symbol().to_string(),
        score: end_close / start_close - 1.0,
        months_available,
        sufficient_history: true,
    }
}

/// Stable sort, highest score first. Equal scores keep their input order.
pub fn rank(mut scores: Vec<MomentumScore>) -> Vec<MomentumScore> {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

/// Keep the top `fraction` of an already-ranked list.
///
/// Keeps `floor(len * fraction)` entries, but never zero when the list is
/// non-empty and `fraction > 0`.
pub fn top_percentile(ranked: &[MomentumScore], fraction: f64) -> Vec<MomentumScore> {
    if ranked.is_empty() || !(fraction > 0.0) {
        return Vec::new();
    }
    let fraction = fraction.min(1.0);
    let keep = ((ranked.len() as f64 * fraction).floor() as usize).max(1);
    ranked[..keep].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    /// One bar on the 15th and one on the 28th of each month, starting Jan 2022.
    fn monthly_series(month_closes: &[f64]) -> PriceSeries {
        let mut bars = Vec::new();
        for (i, &close) in month_closes.iter().enumerate() {
            let year = 2022 + (i / 12) as i32;
            let month = (i % 12) as u32 + 1;
            for day in [15, 28] {
                bars.push(Bar {
                    date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000,
                });
            }
        }
        PriceSeries::new("MOMO", bars).unwrap()
    }

    fn named(symbol: &str, score: f64) -> MomentumScore {
        MomentumScore {
            symbol: symbol.into(),
            score,
            months_available: 13,
            sufficient_history: true,
        }
    }

    #[test]
    fn month_ends_take_last_close() {
        let series = monthly_series(&[10.0, 11.0, 12.0]);
        let ends = month_end_closes(&series);
        assert_eq!(ends.len(), 3);
        assert_eq!(ends[0].0, NaiveDate::from_ymd_opt(2022, 1, 28).unwrap());
        assert_eq!(ends[2].1, 12.0);
    }

    #[test]
    fn twelve_one_score() {
        // 14 month-ends: index 0 = 100, index 12 = 150, index 13 = 10 (skipped)
        let mut closes = vec![100.0; 14];
        closes[12] = 150.0;
        closes[13] = 10.0;
        let s = score(&monthly_series(&closes), 12, 1);
        assert!(s.sufficient_history);
        assert_eq!(s.months_available, 13);
        assert!((s.score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn short_history_fails_closed() {
        let s = score(&monthly_series(&[100.0; 13]), 12, 1);
        assert!(!s.sufficient_history);
        assert_eq!(s.score, 0.0);
        assert_eq!(s.months_available, 12);
    }

    #[test]
    fn empty_series_fails_closed() {
        let empty = PriceSeries::new("NONE", Vec::new()).unwrap();
        let s = score(&empty, 12, 1);
        assert!(!s.sufficient_history);
        assert_eq!(s.months_available, 0);
    }

    #[test]
    fn skip_month_prices_do_not_move_score() {
        let mut closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let base = score(&monthly_series(&closes), 12, 1).score;
        *closes.last_mut().unwrap() = 1.0;
        assert_eq!(score(&monthly_series(&closes), 12, 1).score, base);
    }

    #[test]
    fn rank_is_stable_descending() {
        let ranked = rank(vec![
            named("A", 0.1),
            named("B", 0.3),
            named("C", 0.1),
            named("D", -0.2),
        ]);
        let order: Vec<&str> = ranked.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn top_percentile_floors_with_minimum_one() {
        let ranked: Vec<MomentumScore> = (0..25).map(|i| named(&format!("S{i}"), -(i as f64))).collect();
        assert_eq!(top_percentile(&ranked, 0.10).len(), 2);
        assert_eq!(top_percentile(&ranked[..5], 0.10).len(), 1);
        assert_eq!(top_percentile(&ranked, 0.0).len(), 0);
        assert_eq!(top_percentile(&ranked, 2.0).len(), 25);
        assert_eq!(top_percentile(&[], 0.5).len(), 0);
        assert_eq!(top_percentile(&ranked, 0.10)[0].symbol, "S0");
    }
}
