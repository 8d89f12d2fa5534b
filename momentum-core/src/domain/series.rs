//! The validated, date-ordered bar history of one instrument.
//!
//! Construction is the only place malformed input is rejected. Everything
//! downstream (indicators, scoring, simulation) assumes the invariants hold:
//! strictly ascending dates and sane OHLC values on every bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;

/// Contract violations in caller-supplied price data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("{symbol}: bar {index} dated {date} is not after the previous bar ({previous})")]
    UnorderedDates {
        symbol: String,
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("{symbol}: bar {index} dated {date} has invalid prices (open={open}, high={high}, low={low}, close={close})")]
    InvalidPrices {
        symbol: String,
        index: usize,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Ordered daily bars for a single symbol.
///
/// Gaps for non-trading days are expected; duplicates and out-of-order dates
/// are rejected by [`PriceSeries::new`]. An empty series is valid and flows
/// through every computation as "insufficient history".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Validate and wrap a bar vector.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(SeriesError::EmptySymbol);
        }

        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(SeriesError::InvalidPrices {
                    symbol,
                    index,
                    date: bar.date,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                });
            }
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date <= previous {
                    return Err(SeriesError::UnorderedDates {
                        symbol,
                        index,
                        date: bar.date,
                        previous,
                    });
                }
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar, if any.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Trailing sub-series containing every bar dated on or after `start`.
    ///
    /// Validity is inherited, so no re-check is needed.
    pub fn since(&self, start: NaiveDate) -> PriceSeries {
        let from = self.bars.partition_point(|b| b.date < start);
        PriceSeries {
            symbol: self.symbol.clone(),
            bars: self.bars[from..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn accepts_ordered_bars() {
        let series = PriceSeries::new("SPY", vec![bar(2, 100.0), bar(3, 101.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(series.closes(), vec![100.0, 101.0]);
    }

    #[test]
    fn accepts_empty_series() {
        let series = PriceSeries::new("SPY", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.last().is_none());
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new("SPY", vec![bar(2, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::UnorderedDates { index: 1, .. }));
    }

    #[test]
    fn rejects_descending_dates() {
        let err = PriceSeries::new("SPY", vec![bar(3, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::UnorderedDates { .. }));
    }

    #[test]
    fn rejects_negative_prices() {
        let mut bad = bar(2, 100.0);
        bad.low = -5.0;
        let err = PriceSeries::new("SPY", vec![bad]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidPrices { index: 0, .. }));
    }

    #[test]
    fn rejects_empty_symbol() {
        assert_eq!(
            PriceSeries::new("  ", Vec::new()).unwrap_err(),
            SeriesError::EmptySymbol
        );
    }

    #[test]
    fn since_trims_leading_bars() {
        let series =
            PriceSeries::new("SPY", vec![bar(2, 100.0), bar(3, 101.0), bar(4, 102.0)]).unwrap();
        let tail = series.since(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(tail.closes(), vec![101.0, 102.0]);
        assert_eq!(tail.symbol(), "SPY");
    }

    #[test]
    fn error_message_names_symbol() {
        let err = PriceSeries::new("QQQ", vec![bar(3, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(err.to_string().starts_with("QQQ:"));
    }
}
