//! QA validation: replay a candidate's recent history and grade it.
//!
//! For each symbol the runner trims the series to the backtest horizon,
//! computes indicators, simulates the configured rule, and runs the trade
//! statistics, drawdown analysis and quality gate over the result.

use chrono::{Months, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use momentum_core::domain::{PriceSeries, Trade};
use momentum_core::gate::{evaluate, QaVerdict, Vibe};
use momentum_core::indicators::IndicatorSet;
use momentum_core::risk::DrawdownStats;
use momentum_core::setup::Setup;
use momentum_core::simulator::{analyze_trades, simulate, EquityPoint, TradeStats};

use crate::alpha::AlphaCandidate;
use crate::config::ScanConfig;
use crate::data_loader::LoadedUniverse;

/// Why a symbol reached QA: its Alpha momentum and setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateContext {
    pub momentum_score: f64,
    pub setup: Setup,
    pub confidence: f64,
}

impl From<&AlphaCandidate> for CandidateContext {
    fn from(c: &AlphaCandidate) -> Self {
        Self {
            momentum_score: c.momentum_score,
            setup: c.setup,
            confidence: c.confidence,
        }
    }
}

/// Validation result for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    pub symbol: String,
    pub rule: String,
    pub verdict: QaVerdict,
    pub stats: TradeStats,
    /// Drawdown of the strategy's equity curve. This is what the gate grades.
    pub drawdown: DrawdownStats,
    /// Drawdown of the raw closes over the same window, for comparison.
    pub buy_and_hold: DrawdownStats,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub signal_count: usize,
    pub bar_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Account return over the window, as a fraction.
    pub total_return: f64,
    /// Set when the symbol came from an Alpha scan.
    #[serde(default)]
    pub candidate: Option<CandidateContext>,
}

impl QaReport {
    pub fn vibe(&self) -> Vibe {
        self.verdict.vibe
    }
}

/// Runs QA validation with a fixed configuration.
pub struct QaRunner {
    config: ScanConfig,
    parallel: bool,
}

impl QaRunner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            config: config.clone(),
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The trailing `backtest.years` of `series`.
    pub fn horizon(&self, series: &PriceSeries) -> PriceSeries {
        let Some(end) = series.last_date() else {
            return series.clone();
        };
        match end.checked_sub_months(Months::new(self.config.backtest.years.saturating_mul(12))) {
            Some(start) => series.since(start),
            None => series.clone(),
        }
    }

    pub fn validate(&self, series: &PriceSeries) -> QaReport {
        let window = self.horizon(series);
        let indicators = IndicatorSet::compute(&window, &self.config.indicators);
        let rule = self.config.backtest.rule.build(&self.config.indicators);
        let result = simulate(
            &window,
            &indicators,
            rule.as_ref(),
            &self.config.backtest.simulator(),
        );

        let stats = analyze_trades(&result.trades);
        let drawdown = DrawdownStats::from_curve(&result.equity_values());
        let buy_and_hold = DrawdownStats::from_curve(&window.closes());
        let verdict = evaluate(&stats, &drawdown, &self.config.gate);

        debug!(
            symbol = window.symbol(),
            trades = stats.trade_count,
            win_rate = stats.win_rate,
            max_drawdown_pct = drawdown.max_drawdown_pct,
            vibe = %verdict.vibe,
            "qa validated"
        );

        QaReport {
            symbol: window.symbol().to_string(),
            rule: rule.name().to_string(),
            total_return: result.total_return(),
            stats,
            drawdown,
            buy_and_hold,
            signal_count: result.signal_count,
            bar_count: result.bar_count,
            start_date: window.first_date(),
            end_date: window.last_date(),
            trades: result.trades,
            equity_curve: result.equity_curve,
            verdict,
            candidate: None,
        }
    }

    /// Validate `symbols` from a loaded universe, in the given order.
    ///
    /// Symbols missing from the universe are logged and skipped.
    pub fn validate_many<S: AsRef<str> + Sync>(
        &self,
        universe: &LoadedUniverse,
        symbols: &[S],
    ) -> Vec<QaReport> {
        info!(symbols = symbols.len(), "qa validation started");
        let series: Vec<&PriceSeries> = symbols
            .iter()
            .filter_map(|s| {
                let found = universe.get(s.as_ref());
                if found.is_none() {
                    warn!(symbol = s.as_ref(), "no price data, skipping qa");
                }
                found
            })
            .collect();

        let reports: Vec<QaReport> = if self.parallel {
            series.par_iter().map(|s| self.validate(s)).collect()
        } else {
            series.iter().map(|s| self.validate(s)).collect()
        };

        let count = |vibe: Vibe| reports.iter().filter(|r| r.vibe() == vibe).count();
        info!(
            approved = count(Vibe::Approved),
            conditional = count(Vibe::Conditional),
            rejected = count(Vibe::Rejected),
            "qa validation complete"
        );
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleKind;
    use crate::data_loader::{load_universe, SyntheticProvider};
    use momentum_core::gate::Check;

    fn synthetic(symbols: &[&str]) -> LoadedUniverse {
        let provider = SyntheticProvider::new(
            NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        load_universe(symbols, &provider)
    }

    #[test]
    fn horizon_trims_to_configured_years() {
        let u = synthetic(&["AAA"]);
        let runner = QaRunner::new(&ScanConfig::default());
        let window = runner.horizon(&u.series[0]);
        assert_eq!(window.last_date(), u.series[0].last_date());
        let first = window.first_date().unwrap();
        assert!(first >= NaiveDate::from_ymd_opt(2021, 12, 31).unwrap());
        assert!(first <= NaiveDate::from_ymd_opt(2022, 1, 5).unwrap());
    }

    #[test]
    fn horizon_beyond_calendar_keeps_whole_series() {
        let u = synthetic(&["AAA"]);
        let mut config = ScanConfig::default();
        config.backtest.years = u32::MAX;
        let window = QaRunner::new(&config).horizon(&u.series[0]);
        assert_eq!(window.len(), u.series[0].len());
    }

    #[test]
    fn report_is_consistent() {
        let u = synthetic(&["AAA"]);
        let report = QaRunner::new(&ScanConfig::default()).validate(&u.series[0]);
        assert_eq!(report.rule, "ma_crossover");
        assert_eq!(report.equity_curve.len(), report.bar_count);
        assert_eq!(report.stats.trade_count, report.trades.len());
        assert_eq!(report.verdict.checks.len(), Check::ALL.len());
        assert_eq!(
            report.vibe() == Vibe::Approved,
            report.verdict.suggestions.is_empty()
        );
    }

    #[test]
    fn empty_series_is_rejected_for_sample_size() {
        let empty = PriceSeries::new("NONE", vec![]).unwrap();
        let report = QaRunner::new(&ScanConfig::default()).validate(&empty);
        assert_eq!(report.bar_count, 0);
        assert_eq!(report.vibe(), Vibe::Rejected);
        assert!(!report.verdict.passed(Check::SampleSize));
        assert_eq!(report.start_date, None);
    }

    #[test]
    fn configured_rule_is_used() {
        let u = synthetic(&["AAA"]);
        let mut config = ScanConfig::default();
        config.backtest.rule = RuleKind::PriceAboveAverages;
        let report = QaRunner::new(&config).validate(&u.series[0]);
        assert_eq!(report.rule, "price_above_averages");
    }

    #[test]
    fn validate_many_keeps_order_and_skips_missing() {
        let u = synthetic(&["AAA", "BBB", "CCC"]);
        let runner = QaRunner::new(&ScanConfig::default());
        let parallel = runner.validate_many(&u, &["CCC", "MISSING", "AAA"]);
        let symbols: Vec<&str> = parallel.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["CCC", "AAA"]);

        let serial = QaRunner::new(&ScanConfig::default())
            .with_parallelism(false)
            .validate_many(&u, &["CCC", "MISSING", "AAA"]);
        assert_eq!(parallel, serial);
    }
}
