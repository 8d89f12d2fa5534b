//! Entry and exit rules driving the trade simulator.
//!
//! Rules are position-agnostic: they see bar history and precomputed
//! indicators, never simulator state. The simulator decides what a signal
//! means for the current position.

use std::fmt;

use crate::domain::Bar;
use crate::indicators::IndicatorSet;

/// What a rule says about a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Enter,
    Exit,
}

/// Trait for signal rules.
///
/// `evaluate` must only use data from `bars[0..=index]` and indicator values
/// at or before `index`.
pub trait SignalRule: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Number of bars needed before this rule can fire.
    fn warmup_bars(&self) -> usize;

    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorSet) -> Option<Signal>;
}

/// Moving average crossover: golden cross enters, death cross exits.
///
/// Uses the short and long averages of the [`IndicatorSet`]; the periods are
/// kept for naming and warmup only.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        Self {
            fast_period,
            slow_period,
        }
    }

    pub fn default_params() -> Self {
        Self::new(60, 200)
    }
}

impl SignalRule for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.slow_period
    }

    fn evaluate(&self, _bars: &[Bar], index: usize, indicators: &IndicatorSet) -> Option<Signal> {
        // Need a previous bar for crossover detection.
        if index == 0 {
            return None;
        }

        let fast_cur = *indicators.sma_short.get(index)?;
        let slow_cur = *indicators.sma_long.get(index)?;
        let fast_prev = indicators.sma_short[index - 1];
        let slow_prev = indicators.sma_long[index - 1];

        if fast_cur.is_nan() || slow_cur.is_nan() || fast_prev.is_nan() || slow_prev.is_nan() {
            return None;
        }

        // Golden cross: previous bar fast <= slow, current bar fast > slow.
        if fast_cur > slow_cur && fast_prev <= slow_prev {
            return Some(Signal::Enter);
        }

        // Death cross: previous bar fast >= slow, current bar fast < slow.
        if fast_cur < slow_cur && fast_prev >= slow_prev {
            return Some(Signal::Exit);
        }

        None
    }
}

/// Enters when the close first rises above both averages, exits when it
/// falls back below the long average.
#[derive(Debug, Clone, Default)]
pub struct PriceAboveAverages;

impl PriceAboveAverages {
    fn above_both(bar: &Bar, indicators: &IndicatorSet, index: usize) -> Option<bool> {
        let short = indicators.sma_short[index];
        let long = indicators.sma_long[index];
        if short.is_nan() || long.is_nan() {
            return None;
        }
        Some(bar.close > short && bar.close > long)
    }
}

impl SignalRule for PriceAboveAverages {
    fn name(&self) -> &str {
        "price_above_averages"
    }

    fn warmup_bars(&self) -> usize {
        1
    }

    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorSet) -> Option<Signal> {
        if index == 0 || index >= bars.len() || index >= indicators.len() {
            return None;
        }
        let now = Self::above_both(&bars[index], indicators, index)?;
        let before = Self::above_both(&bars[index - 1], indicators, index - 1)?;

        if now && !before {
            return Some(Signal::Enter);
        }
        let long = indicators.sma_long[index];
        let prev_long = indicators.sma_long[index - 1];
        if bars[index].close < long && bars[index - 1].close >= prev_long {
            return Some(Signal::Exit);
        }
        None
    }
}

type Predicate = dyn Fn(&[Bar], usize, &IndicatorSet) -> bool + Send + Sync;

/// Rule built from caller-supplied entry and exit predicates.
///
/// Entry is checked first when both fire on the same bar.
pub struct PredicateRule {
    name: String,
    entry: Box<Predicate>,
    exit: Box<Predicate>,
}

impl PredicateRule {
    pub fn new<E, X>(name: impl Into<String>, entry: E, exit: X) -> Self
    where
        E: Fn(&[Bar], usize, &IndicatorSet) -> bool + Send + Sync + 'static,
        X: Fn(&[Bar], usize, &IndicatorSet) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            entry: Box::new(entry),
            exit: Box::new(exit),
        }
    }
}

impl fmt::Debug for PredicateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl SignalRule for PredicateRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn evaluate(&self, bars: &[Bar], index: usize, indicators: &IndicatorSet) -> Option<Signal> {
        if (self.entry)(bars, index, indicators) {
            Some(Signal::Enter)
        } else if (self.exit)(bars, index, indicators) {
            Some(Signal::Exit)
        } else {
            None
        }
    }
}
